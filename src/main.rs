//! wordcloud-gen entrypoint.
use std::ffi::OsString;
use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wordcloud_gen::{console::Console, FontRegistry, Language, Session, WordCloud};

/// CLI arguments.
#[derive(Parser, Debug)]
#[clap(name = "wordcloud-gen", version, about = "Word cloud generator")]
struct Args {
    /// Interface language: zh or en.
    #[clap(long = "lang")]
    lang: Option<Language>,
}

const VALUE_FLAGS: [&str; 1] = ["--lang"];
const BARE_FLAGS: [&str; 4] = ["-h", "--help", "-V", "--version"];

/// Drops every argument the CLI does not know instead of rejecting it.
fn known_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let mut kept: Vec<OsString> = iter.next().into_iter().collect();
    let mut expects_value = false;

    for arg in iter {
        let text = arg.to_string_lossy().into_owned();
        if expects_value {
            expects_value = false;
            kept.push(arg);
        } else if VALUE_FLAGS.contains(&text.as_str()) {
            expects_value = true;
            kept.push(arg);
        } else if BARE_FLAGS.contains(&text.as_str())
            || VALUE_FLAGS
                .iter()
                .any(|flag| text.starts_with(&format!("{flag}=")))
        {
            kept.push(arg);
        } else {
            debug!(target: "runtime", arg = %text, "ignored_argument");
        }
    }

    kept
}

fn configure_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    configure_logging();

    let args = Args::parse_from(known_args(std::env::args_os()));
    let language = args.lang.unwrap_or_default();
    info!(target: "runtime", %language, "startup");

    let fonts = FontRegistry::discover();
    let session = Session::new(language, WordCloud::default(), fonts);

    let stdin = io::stdin();
    let mut console = Console::new(session, stdin.lock(), io::stdout());
    console.run()?;

    info!(target: "runtime", "shutdown");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn unknown_flags_are_dropped() {
        let kept = known_args(os(&["bin", "--verbose", "--lang", "en", "-x", "stray"]));
        assert_eq!(kept, os(&["bin", "--lang", "en"]));

        let args = Args::parse_from(kept);
        assert_eq!(args.lang, Some(Language::English));
    }

    #[test]
    fn inline_value_is_kept() {
        let kept = known_args(os(&["bin", "--lang=zh", "--fullscreen"]));
        let args = Args::parse_from(kept);
        assert_eq!(args.lang, Some(Language::Chinese));
    }

    #[test]
    fn language_defaults_to_chinese() {
        let args = Args::parse_from(known_args(os(&["bin", "--whatever"])));
        assert_eq!(args.lang.unwrap_or_default(), Language::Chinese);
    }
}
