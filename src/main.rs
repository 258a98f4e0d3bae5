use anyhow::{Context, Result};
use clap::Parser;
use http_util::{Body, Client, Data};
use std::time::Duration;

/// http-util - send an HTTP request with retries
///
/// Builds a request from the given options, sends it with exponential backoff
/// between failed attempts, and prints the response body, cookies and headers.
///
/// Examples:
///   http-util http://host/put_offer_apply/ -X POST -f job_id=2 --retry 5
#[derive(Parser, Debug)]
#[command(author, version = env!("HTTP_UTIL_VERSION"), about)]
struct Cli {
    /// Request URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,

    /// Query parameter appended to the URL (repeatable)
    #[arg(long = "query", short = 'q', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    /// Request header (repeatable)
    #[arg(long = "header", short = 'H', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub headers: Vec<(String, String)>,

    /// Form field, sent urlencoded unless --multipart is given (repeatable)
    #[arg(long = "form", short = 'f', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub form: Vec<(String, String)>,

    /// Send form fields as multipart/form-data
    #[arg(long, requires = "form")]
    pub multipart: bool,

    /// Raw request body
    #[arg(long, short = 'd', value_name = "BODY", conflicts_with = "form")]
    pub data: Option<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 10_000)]
    pub timeout: u64,

    /// Number of additional attempts after the first
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub retry: u32,

    /// Retry while the response body is shorter than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub min_body: Option<usize>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    fn into_client(self) -> Client {
        let mut client = Client::new(self.url, self.method)
            .with_timeout(Duration::from_millis(self.timeout))
            .with_retries(self.retry);

        client.query_params = self.query.into_iter().collect();
        client.headers = self.headers.into_iter().collect();

        client.body = if !self.form.is_empty() {
            let fields: Data = self.form.into_iter().collect();
            if self.multipart {
                Body::multipart(fields)
            } else {
                Body::urlencoded(fields)
            }
        } else {
            Body::raw(self.data.unwrap_or_default())
        };

        if let Some(min) = self.min_body {
            client = client.with_recheck(move |res| res.body.len() >= min);
        }

        client
    }
}

fn print_section(title: &str, data: &Data) {
    println!("{}:", title);
    for (key, value) in data.sorted() {
        println!("  {}: {}", key, value);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let client = cli.into_client();

    let response = client
        .send()
        .await
        .with_context(|| format!("{} {} failed", client.method, client.query_url()))?;

    println!("{}", response.text());
    print_section("Cookies", &response.cookies);
    print_section("Headers", &response.headers);
    Ok(())
}
