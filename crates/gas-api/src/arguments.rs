use {
    anyhow::{Context, Result, anyhow, ensure},
    registrar_gas::{
        backend::tenderly::{DEFAULT_URL, TenderlyApi, TenderlyHttpApi, dto::ValueFormat},
        overrides::SlotEncoding,
    },
    std::{
        fmt::{self, Display, Formatter},
        net::SocketAddr,
        str::FromStr,
        sync::Arc,
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
    url::Url,
};

#[derive(clap::Parser)]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    #[clap(flatten)]
    pub tenderly: TenderlyArguments,

    #[clap(long, env, default_value = "0.0.0.0:8080")]
    pub bind_address: SocketAddr,

    /// Node endpoints in the format `<CHAIN_ID>|<URL>|<ENCODING>`, separated
    /// by commas. Endpoints of the same chain are tried in the given order.
    /// `ENCODING` is how the node expects storage overrides: `padded` for full
    /// 32 byte words (default) or `compact` for quantities without leading
    /// zeros.
    #[clap(long, env, use_value_delimiter = true)]
    pub endpoints: Vec<Endpoint>,

    /// Timeout for every request to a node or to Tenderly.
    #[clap(long, env, default_value = "10s", value_parser = humantime::parse_duration)]
    pub http_timeout: Duration,
}

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(long, env, default_value = "warn,gas_api=debug,registrar_gas=debug")]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Output log events as JSON.
    #[clap(long, env)]
    pub log_json: bool,
}

impl LoggingArguments {
    pub fn config(&self) -> observe::Config {
        observe::Config::new(
            &self.log_filter,
            self.log_stderr_threshold.into_level(),
            self.log_json,
        )
    }
}

/// Tenderly API arguments. Tenderly is only used if user, project and key are
/// all set.
#[derive(clap::Parser)]
#[group(skip)]
pub struct TenderlyArguments {
    /// The Tenderly user associated with the API key.
    #[clap(long, env)]
    pub tenderly_user: Option<String>,

    /// The Tenderly project associated with the API key.
    #[clap(long, env)]
    pub tenderly_project: Option<String>,

    #[clap(long, env)]
    pub tenderly_api_key: Option<String>,

    #[clap(long, env, default_value = DEFAULT_URL)]
    pub tenderly_url: Url,

    /// How amounts of wei are sent to Tenderly, `decimal` or `hex`.
    #[clap(long, env, default_value = "decimal")]
    pub tenderly_value_format: ValueFormat,
}

impl TenderlyArguments {
    pub fn api(&self, timeout: Duration) -> Result<Option<Arc<dyn TenderlyApi>>> {
        let (Some(user), Some(project), Some(api_key)) = (
            self.tenderly_user.as_deref(),
            self.tenderly_project.as_deref(),
            self.tenderly_api_key.as_deref(),
        ) else {
            return Ok(None);
        };
        let api = TenderlyHttpApi::new(&self.tenderly_url, user, project, api_key, timeout)?;
        Ok(Some(Arc::new(api)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub chain_id: u64,
    pub url: Url,
    pub encoding: SlotEncoding,
}

impl Endpoint {
    /// Label for logs. Does not include the path since node URLs often carry
    /// API keys there.
    pub fn name(&self) -> String {
        format!(
            "{}/{}",
            self.chain_id,
            self.url.host_str().unwrap_or("unknown")
        )
    }
}

impl FromStr for Endpoint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('|');
        let chain_id = parts
            .next()
            .ok_or_else(|| anyhow!("missing chain id"))?
            .trim()
            .parse()
            .context("invalid chain id")?;
        let url = parts
            .next()
            .ok_or_else(|| anyhow!("missing url"))?
            .trim()
            .parse()
            .context("invalid url")?;
        let encoding = match parts.next() {
            Some(encoding) => encoding.trim().parse()?,
            None => SlotEncoding::default(),
        };
        ensure!(parts.next().is_none(), "too many fields in endpoint {s:?}");
        Ok(Self {
            chain_id,
            url,
            encoding,
        })
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.encoding)
    }
}

pub fn display_secret_option<T>(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<T>,
) -> fmt::Result {
    display_option(f, name, &option.as_ref().map(|_| "SECRET"))
}

pub fn display_option(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<impl Display>,
) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}

pub fn display_list<T>(
    f: &mut Formatter<'_>,
    name: &str,
    iter: impl IntoIterator<Item = T>,
) -> fmt::Result
where
    T: Display,
{
    write!(f, "{name}: [")?;
    for (i, item) in iter.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    writeln!(f, "]")
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            log_json,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "log_json: {log_json}")?;
        Ok(())
    }
}

impl Display for TenderlyArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        display_option(f, "tenderly_user", &self.tenderly_user)?;
        display_option(f, "tenderly_project", &self.tenderly_project)?;
        display_secret_option(f, "tenderly_api_key", &self.tenderly_api_key)?;
        writeln!(f, "tenderly_url: {}", self.tenderly_url)?;
        writeln!(f, "tenderly_value_format: {}", self.tenderly_value_format)?;
        Ok(())
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            tenderly,
            bind_address,
            endpoints,
            http_timeout,
        } = self;

        write!(f, "{logging}")?;
        write!(f, "{tenderly}")?;
        writeln!(f, "bind_address: {bind_address}")?;
        display_list(f, "endpoints", endpoints)?;
        writeln!(f, "http_timeout: {http_timeout:?}")?;
        Ok(())
    }
}
