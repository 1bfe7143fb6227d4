//! Renders dictionary lookup results as a tabbed definition page.
//!
//! The lookup service answers `GET /api/<word>` with a loosely structured JSON
//! document ([`LookupResult`]). [`render`] groups its senses by part of speech,
//! picks the initial tab and returns a [`RenderedPage`], whose
//! [`view`](RenderedPage::view) is a [`view::Node`] tree ready to serialize.

pub mod client;
pub mod model;
pub mod navigation;
pub mod page;
pub mod render;
pub mod view;
#[cfg(feature = "web")]
pub mod web;

pub use client::{ApiRoute, ClientConfig, FetchError, LookupClient};
pub use model::{DefinitionEntry, LookupResult, Origin, Sense, SourceId};
pub use render::{
    DefinitionPage, Entry, RenderConfig, RenderedPage, TabError, TabState, group_entries, render,
};
