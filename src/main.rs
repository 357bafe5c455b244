use anyhow::Context;
use argh::FromArgs;
use std::fs::File;
use std::io::{self, BufReader};
use terminal::Interpreter;
use terminal::env::Environment;
use terminal::messages::Locale;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Line-oriented interpreter for pipelines of builtin commands
/// (echo, cat, pwd, wc, grep).
struct Args {
    #[argh(option, default = "Locale::Ru")]
    /// language of error messages: `ru` or `en`
    locale: Locale,

    #[argh(switch)]
    /// read commands from standard input without line editing
    batch: bool,

    #[argh(switch, short = 'v')]
    /// log debug diagnostics to standard error
    verbose: bool,

    #[argh(positional)]
    /// file with one command per line, executed instead of reading the terminal
    script: Option<String>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    init_logging(args.verbose);

    let env = Environment::new().with_locale(args.locale);
    let mut sh = Interpreter::with_env(env);
    let (mut stdout, mut stderr) = (io::stdout(), io::stderr());

    match args.script {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("cannot open {}", path))?;
            sh.run(BufReader::new(file), &mut stdout, &mut stderr)
        }
        None if args.batch => sh.run(io::stdin().lock(), &mut stdout, &mut stderr),
        None => sh.repl(),
    }
}
