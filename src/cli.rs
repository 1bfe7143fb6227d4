use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
#[cfg(feature = "web")]
use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::warn;
use wordpage_rs::page::definition_document;
use wordpage_rs::{
    ApiRoute, ClientConfig, LookupClient, LookupResult, RenderConfig, RenderedPage, SourceId,
    render,
};

#[derive(Parser, Debug)]
#[command(
    name = "wordpage-rs",
    about = "Render dictionary lookups as definition pages",
    version
)]
pub struct Cli {
    /// Emit the structured page as JSON instead of HTML.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a lookup result read from a file or stdin.
    Render {
        /// JSON file holding the lookup result; stdin when omitted.
        path: Option<PathBuf>,
        /// Word shown in the page title (defaults to the file stem).
        #[arg(long)]
        word: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Fetch a word from the lookup service and render it.
    Fetch {
        /// Word to look up.
        word: String,
        #[command(flatten)]
        upstream: UpstreamArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Serve rendered definition pages over HTTP.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
        #[command(flatten)]
        upstream: UpstreamArgs,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Args, Debug)]
struct UpstreamArgs {
    /// Base URL of the lookup service.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    upstream: String,
    /// Lookup path layout: `word` for /api/<word>, `define` for /api/define/<word>.
    #[arg(long, default_value_t = ApiRoute::Word)]
    route: ApiRoute,
    /// Give up on the lookup service after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl UpstreamArgs {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.upstream.clone(),
            route: self.route,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Images per gallery column; 0 keeps all images in one column.
    #[arg(long, default_value_t = 3)]
    image_columns: usize,
    /// Tab order, comma separated (e.g. `wiki,vocab`).
    #[arg(long, value_delimiter = ',')]
    priority: Vec<SourceId>,
    /// Emit markup from the lookup service as-is instead of escaping it.
    #[arg(long)]
    trust_markup: bool,
}

impl RenderArgs {
    fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig {
            image_column_batch_size: Some(self.image_columns).filter(|size| *size > 0),
            trust_markup: self.trust_markup,
            ..RenderConfig::default()
        };
        if !self.priority.is_empty() {
            config.source_priority = self.priority.clone();
        }
        config
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[command(flatten)]
    render: RenderArgs,
    /// Select this source's tab instead of the first one.
    #[arg(long)]
    tab: Option<SourceId>,
    /// Print only the rendered fragment, without the page shell.
    #[arg(long, conflicts_with = "outline")]
    fragment: bool,
    /// Print a plain-text outline of the page.
    #[arg(long)]
    outline: bool,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Render { path, word, output } => handle_render(path, word, output, cli.json),
        Command::Fetch {
            word,
            upstream,
            output,
        } => handle_fetch(word, upstream, output, cli.json),
        #[cfg(feature = "web")]
        Command::Serve {
            addr,
            upstream,
            render,
        } => handle_serve(addr, upstream, render),
    }
}

fn handle_render(
    path: Option<PathBuf>,
    word: Option<String>,
    output: OutputArgs,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let raw = match &path {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let result: LookupResult = serde_json::from_str(&raw)
        .map_err(|err| format!("Lookup result is not valid JSON: {err}"))?;
    let word = word
        .or_else(|| path.as_deref().and_then(file_stem))
        .unwrap_or_else(|| "lookup".to_string());
    let page = render(&result, &output.render.render_config());
    emit(&word, page, &output, as_json)
}

fn handle_fetch(
    word: String,
    upstream: UpstreamArgs,
    output: OutputArgs,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let client = LookupClient::new(upstream.client_config())?;
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(client.fetch(&word))?;
    let page = render(&result, &output.render.render_config());
    emit(&word, page, &output, as_json)
}

#[cfg(feature = "web")]
fn handle_serve(
    addr: SocketAddr,
    upstream: UpstreamArgs,
    render: RenderArgs,
) -> Result<(), Box<dyn Error>> {
    let config = wordpage_rs::web::WebConfig {
        addr,
        upstream: upstream.client_config(),
        render: render.render_config(),
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(wordpage_rs::web::serve(config))?;
    Ok(())
}

fn emit(
    word: &str,
    mut page: RenderedPage,
    output: &OutputArgs,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if let Some(tab) = output.tab {
        apply_tab(&mut page, tab);
    }
    if as_json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else if output.outline {
        print_outline(word, &page);
    } else if output.fragment {
        println!("{}", page.to_html());
    } else {
        println!("{}", definition_document(word, &page)?);
    }
    Ok(())
}

/// Selects `tab` when the page has it; otherwise keeps the default tab.
fn apply_tab(page: &mut RenderedPage, tab: SourceId) {
    if let Err(err) = page.select_tab(tab) {
        warn!(tab = %tab, error = %err, "ignoring --tab");
    }
}

/// `a`..`z`, then `aa`, `ab`, ... like an `<ol type="a">`.
fn sub_sense_label(index: usize) -> String {
    let mut letters = Vec::new();
    let mut rest = index;
    loop {
        letters.push(char::from(b'a' + (rest % 26) as u8));
        if rest < 26 {
            break;
        }
        rest = rest / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

fn print_outline(word: &str, page: &RenderedPage) {
    let definition = match page {
        RenderedPage::NotFound => {
            println!("No entry found for word {word:?}.");
            return;
        }
        RenderedPage::Unavailable { reason } => {
            println!("Could not load {word:?}: {reason}");
            return;
        }
        RenderedPage::Definition(definition) => definition,
    };

    println!("Word: {word}");
    for (idx, line) in definition.overview.iter().enumerate() {
        if idx == 0 {
            println!("  {line}");
        } else {
            println!("    {line}");
        }
    }

    let tabs: Vec<_> = definition
        .tabs
        .tabs()
        .iter()
        .map(|&source| {
            if definition.tabs.is_selected(source) {
                format!("[{}]", source.label())
            } else {
                source.label().to_string()
            }
        })
        .collect();
    if !tabs.is_empty() {
        println!("\nTabs: {}", tabs.join("  "));
    }

    for panel in &definition.panels {
        let marker = if definition.is_visible(panel.source) {
            " (shown)"
        } else {
            ""
        };
        println!("\n{}{marker}:", panel.source.label());
        for entry in &panel.entries {
            let label = if entry.part_of_speech.is_empty() {
                "unknown"
            } else {
                entry.part_of_speech.as_str()
            };
            println!("  {label}");
            for (number, item) in entry.items.iter().enumerate() {
                println!("    {}. {}", number + 1, item.sense.meaning);
                for example in &item.sense.examples {
                    println!("         - {example}");
                }
                for (idx, sub) in item.sub_senses.iter().enumerate() {
                    println!("       {}. {}", sub_sense_label(idx), sub.meaning);
                    for example in &sub.examples {
                        println!("            - {example}");
                    }
                }
            }
        }
    }

    let images: usize = definition.image_columns.iter().map(Vec::len).sum();
    if images > 0 {
        println!(
            "\nImages: {images} in {} column(s)",
            definition.image_columns.len()
        );
    }

    if !definition.origins.is_empty() {
        println!("\nWord Origin:");
        for origin in &definition.origins {
            let tag = origin
                .tag()
                .map(|pos| format!("[{pos}] "))
                .unwrap_or_default();
            let mut paragraphs = origin.paragraphs();
            if let Some(first) = paragraphs.next() {
                println!("  {tag}{first}");
            }
            for para in paragraphs {
                println!("    {para}");
            }
        }
    }

    if !definition.sources.is_empty() {
        println!("\nSources: {}", definition.sources.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(json: &str) -> RenderedPage {
        let result: LookupResult = serde_json::from_str(json).unwrap();
        render(&result, &RenderConfig::default())
    }

    #[test]
    fn unknown_tab_keeps_the_default_selection() {
        let mut page = rendered(r#"{"vocabDefs":[{"partOfSpeech":"noun","meaning":"v"}]}"#);
        apply_tab(&mut page, SourceId::Urban);
        assert_eq!(page.tabs().unwrap().selected(), Some(SourceId::Vocabulary));

        let mut missing = rendered("{}");
        apply_tab(&mut missing, SourceId::Urban);
        assert!(missing.is_not_found());
    }

    #[test]
    fn known_tab_is_selected() {
        let mut page = rendered(
            r#"{"vocabDefs":[{"partOfSpeech":"noun","meaning":"v"}],
                "wikiDefs":[{"partOfSpeech":"noun","meaning":"w"}]}"#,
        );
        apply_tab(&mut page, SourceId::Wiktionary);
        assert_eq!(page.tabs().unwrap().selected(), Some(SourceId::Wiktionary));
    }

    #[test]
    fn sub_sense_labels_continue_past_z() {
        assert_eq!(sub_sense_label(0), "a");
        assert_eq!(sub_sense_label(25), "z");
        assert_eq!(sub_sense_label(26), "aa");
        assert_eq!(sub_sense_label(27), "ab");
        assert_eq!(sub_sense_label(52), "ba");
        assert_eq!(sub_sense_label(701), "zz");
        assert_eq!(sub_sense_label(702), "aaa");
    }

    #[test]
    fn escaping_is_the_default_render_mode() {
        let cli = Cli::try_parse_from(["wordpage-rs", "render", "dog.json"]).unwrap();
        let Command::Render { output, .. } = cli.command else {
            panic!("expected render command");
        };
        assert!(!output.render.render_config().trust_markup);

        let cli =
            Cli::try_parse_from(["wordpage-rs", "render", "dog.json", "--trust-markup"]).unwrap();
        let Command::Render { output, .. } = cli.command else {
            panic!("expected render command");
        };
        assert!(output.render.render_config().trust_markup);
    }
}
