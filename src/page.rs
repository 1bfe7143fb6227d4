use crate::render::RenderedPage;
use askama::Template;
use rand::seq::SliceRandom;

const FACES: &[&str] = &[
    "pwp", "TwT", "x-x", "<(X_X)>", "-w-", "(>_<)", "(·.·)", "(≥o≤)", "(·_·)", "\\(o_o)/", "(;-;)",
];

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ word }} • wordpage</title>
    <link rel="stylesheet" href="/static/style.css">
    <script src="/static/page.js" defer></script>
  </head>
  <body>
    <header class="search-bar">
      <a href="/" class="brand">wordpage</a>
      <input id="search" type="text" autocomplete="off" spellcheck="false" placeholder="Search for a word" value="{{ word }}">
    </header>
    <main>
      <h1 class="word-title">{{ word }}</h1>
      <div id="word">{{ body|safe }}</div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct DefinitionTemplate<'a> {
    word: &'a str,
    body: String,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>wordpage</title>
    <link rel="stylesheet" href="/static/style.css">
    <script src="/static/page.js" defer></script>
  </head>
  <body class="home">
    <main>
      <h1 class="brand">wordpage</h1>
      <p class="gray">Definitions, examples, pictures and word origins in one place.</p>
      <input id="search" type="text" autocomplete="off" spellcheck="false" placeholder="Search for a word" autofocus>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct HomeTemplate;

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Not found • wordpage</title>
    <link rel="stylesheet" href="/static/style.css">
    <script src="/static/page.js" defer></script>
  </head>
  <body class="home">
    <main>
      <h1 class="face">{{ face }}</h1>
      <p class="gray">There's nothing here.</p>
      <input id="search" type="text" autocomplete="off" spellcheck="false" placeholder="Search for a word">
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct MissingTemplate<'a> {
    face: &'a str,
}

/// Full HTML document for a rendered lookup.
pub fn definition_document(word: &str, page: &RenderedPage) -> Result<String, askama::Error> {
    DefinitionTemplate {
        word,
        body: page.to_html(),
    }
    .render()
}

pub fn home_document() -> Result<String, askama::Error> {
    HomeTemplate.render()
}

/// 404 page for unknown routes, with a randomly picked face.
pub fn missing_document() -> Result<String, askama::Error> {
    let face = FACES.choose(&mut rand::thread_rng()).copied().unwrap_or("(·_·)");
    MissingTemplate { face }.render()
}
