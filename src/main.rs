use catalogr::build::build_site;
use catalogr::config::*;
use catalogr::markdown::MarkdownOptions;
use clap::{App, Arg, ArgMatches};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = app().get_matches();

    init_logging(matches.is_present("verbose"));

    if let Err(code) = run(&config(&matches)) {
        std::process::exit(code);
    }
}

fn app<'a>() -> App<'a, 'a> {
    App::new("catalogr")
        .about("Builds HTML pages and a JSON catalog from markdown posts")
        .arg(path_arg("content", "Directory of markdown sources [default: content]"))
        .arg(path_arg("output", "Root directory for generated pages [default: posts]"))
        .arg(path_arg("template", "Post template [default: _template.html]"))
        .arg(path_arg("index", "Catalog file to write [default: posts.json]"))
        .arg(
            Arg::with_name("keep-going")
                .long("keep-going")
                .help("Skip posts that fail to build instead of stopping"),
        )
        .arg(
            Arg::with_name("unsafe-html")
                .long("unsafe-html")
                .help("Pass raw HTML in posts through to the pages"),
        )
        .arg(
            Arg::with_name("extensions")
                .long("extensions")
                .help("Enable tables, footnotes, strikethrough, and task lists"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log skipped files and other debug output"),
        )
}

fn path_arg<'a>(name: &'a str, help: &'a str) -> Arg<'a, 'a> {
    Arg::with_name(name)
        .long(name)
        .takes_value(true)
        .value_name("PATH")
        .help(help)
}

// Unset paths fall back to the fixed project layout.
fn config(matches: &ArgMatches) -> Config {
    let defaults = Config::default();
    let path = |name: &str, default: PathBuf| match matches.value_of(name) {
        Some(value) => PathBuf::from(value),
        None => default,
    };
    Config {
        content_directory: path("content", defaults.content_directory),
        output_directory: path("output", defaults.output_directory),
        template_file: path("template", defaults.template_file),
        index_file: path("index", defaults.index_file),
        on_failure: match matches.is_present("keep-going") {
            true => FailurePolicy::Continue,
            false => FailurePolicy::Abort,
        },
        markdown: MarkdownOptions {
            unsafe_html: matches.is_present("unsafe-html"),
            extensions: matches.is_present("extensions"),
        },
    }
}

fn init_logging(verbose: bool) {
    let level = match verbose {
        true => Level::DEBUG,
        false => Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();
}

fn run(config: &Config) -> Result<(), i32> {
    match build_site(config) {
        Err(err) => {
            error!("{}", err);
            Err(1)
        }
        Ok(report) if !report.failures.is_empty() => {
            error!(
                "{} of {} posts failed to build",
                report.failures.len(),
                report.failures.len() + report.built
            );
            Err(1)
        }
        Ok(report) => {
            info!("Built {} posts, catalog updated", report.built);
            Ok(())
        }
    }
}
