use failure::{bail, Fallible};
use log::warn;
use stockpile::{
    dal::{RecipeProvider, DB},
    router::{serve_on, Settings},
    util::log_err,
};
use std::{
    net::{SocketAddr, ToSocketAddrs},
    process::exit,
};
use structopt::StructOpt;
use tokio::runtime::Builder;

fn main() {
    dotenv::dotenv().ok();

    let options = Options::from_args();
    if let Err(err) = options.start_logger() {
        warn!("Logging couldn't start: {}", err);
    }

    if let Err(err) = run(options) {
        log_err(&err);
        exit(1);
    }
}

fn run(options: Options) -> Fallible<()> {
    let serve_addr = options.serve_addr()?;
    let mut runtime = Builder::new().build()?;
    let db = DB::connect(&options.database_url)?;
    let provider = RecipeProvider::new(
        &options.recipe_api_url,
        options.recipe_api_key.clone(),
        options.recipe_results,
    )?;
    let settings = Settings {
        session_days: options.session_days,
    };
    runtime.block_on(serve_on(serve_addr, db, provider, settings))
}

#[derive(Debug, StructOpt)]
#[structopt(raw(setting = "::structopt::clap::AppSettings::ColoredHelp"))]
pub struct Options {
    /// Turns off message output. Passing once prevents logging to syslog. Passing twice or more
    /// disables all logging.
    #[structopt(short = "q", long = "quiet", parse(from_occurrences))]
    quiet: usize,

    /// Increases the verbosity. Default verbosity is warnings and higher to syslog, info and
    /// higher to the console.
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The URL of the Postgres database.
    #[structopt(long = "db", env = "DATABASE_URL")]
    pub database_url: String,

    /// The host to serve on.
    #[structopt(short = "H", long = "host", env = "HOST", default_value = "::")]
    host: String,

    /// The port to serve on.
    #[structopt(short = "P", long = "port", env = "PORT", default_value = "8080")]
    port: u16,

    /// The API key for the recipe search service.
    #[structopt(long = "recipe-api-key", env = "RECIPE_API_KEY")]
    pub recipe_api_key: String,

    /// The recipe search endpoint.
    #[structopt(
        long = "recipe-api-url",
        env = "RECIPE_API_URL",
        default_value = "https://api.spoonacular.com/recipes/complexSearch"
    )]
    pub recipe_api_url: String,

    /// How many recipes to ask for per search.
    #[structopt(long = "recipe-results", env = "RECIPE_RESULTS", default_value = "5")]
    pub recipe_results: u32,

    /// How many days a sign-in lasts.
    #[structopt(long = "session-days", env = "SESSION_DAYS", default_value = "30")]
    pub session_days: u64,

    /// The syslog server to send logs to.
    #[structopt(short = "s", long = "syslog-server", env = "SYSLOG_SERVER")]
    syslog_server: Option<String>,
}

impl Options {
    /// Get the address to serve on.
    pub fn serve_addr(&self) -> Fallible<SocketAddr> {
        let addrs = (&self.host as &str, self.port)
            .to_socket_addrs()?
            .collect::<Vec<_>>();
        if addrs.is_empty() {
            bail!("No matching address exists")
        } else {
            Ok(addrs[0])
        }
    }

    /// Sets up logging as specified by the `-q`, `-s`, and `-v` flags.
    pub fn start_logger(&self) -> Fallible<()> {
        use fern::Dispatch;
        use log::LevelFilter;

        if self.quiet >= 2 {
            return Ok(());
        }

        let (console_ll, syslog_ll) = match self.verbose {
            0 => (LevelFilter::Info, LevelFilter::Warn),
            1 => (LevelFilter::Debug, LevelFilter::Info),
            2 => (LevelFilter::Trace, LevelFilter::Debug),
            _ => (LevelFilter::Trace, LevelFilter::Trace),
        };

        let fern = Dispatch::new().chain(
            Dispatch::new()
                .level(console_ll)
                .format(move |out, message, record| {
                    out.finish(format_args!("[{}] {}", record.level(), message))
                })
                .chain(std::io::stderr()),
        );

        let fern = if self.quiet == 0 {
            let formatter = syslog::Formatter3164 {
                facility: syslog::Facility::LOG_DAEMON,
                hostname: hostname::get_hostname(),
                process: "stockpile".to_owned(),
                pid: ::std::process::id() as i32,
            };

            let syslog = if let Some(ref server) = self.syslog_server {
                syslog::tcp(formatter, server).map_err(failure::SyncFailure::new)?
            } else {
                syslog::unix(formatter.clone())
                    .or_else(|_| syslog::tcp(formatter.clone(), ("127.0.0.1", 601)))
                    .or_else(|_| {
                        syslog::udp(formatter.clone(), ("127.0.0.1", 0), ("127.0.0.1", 514))
                    })
                    .map_err(failure::SyncFailure::new)?
            };

            fern.chain(Dispatch::new().level(syslog_ll).chain(syslog))
        } else {
            fern
        };

        fern.apply()?;
        Ok(())
    }
}
