#[cfg(unix)]
use tokio::signal::unix::{self, SignalKind};
use {
    crate::{api, arguments::Arguments},
    anyhow::{Context, Result},
    clap::Parser,
    registrar_gas::{
        Endpoints,
        Estimator,
        backend::{Backend, node::NodeBackend, tenderly::TenderlyBackend},
        network,
    },
    std::{collections::HashMap, net::SocketAddr, sync::Arc},
    tokio::sync::oneshot,
};

pub async fn start(args: impl Iterator<Item = String>) {
    let args = Arguments::parse_from(args);
    observe::tracing::initialize(&args.logging.config());
    tracing::info!("running gas api with validated arguments:\n{}", args);
    if let Err(err) = run(args, None).await {
        tracing::error!(?err, "gas api exited");
        std::process::exit(1);
    }
}

pub async fn run(args: Arguments, bind: Option<oneshot::Sender<SocketAddr>>) -> Result<()> {
    let estimator = Arc::new(Estimator::new(endpoints(&args)?));
    let app = api::handle_all_routes(estimator);

    let listener = tokio::net::TcpListener::bind(args.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", args.bind_address))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, "serving gas api");
    if let Some(bind) = bind {
        let _ = bind.send(local_addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")
}

/// Groups the configured nodes per chain. When Tenderly is configured it is
/// tried after all nodes of a chain, reading state through the first node.
fn endpoints(args: &Arguments) -> Result<HashMap<u64, Endpoints>> {
    let mut endpoints = HashMap::<u64, Endpoints>::new();
    for endpoint in &args.endpoints {
        if network::find(endpoint.chain_id).is_none() {
            tracing::warn!(endpoint = %endpoint.name(), "ignoring endpoint of unsupported chain");
            continue;
        }
        let node = NodeBackend::new(
            endpoint.name(),
            endpoint.url.clone(),
            endpoint.encoding,
            args.http_timeout,
        );
        endpoints
            .entry(endpoint.chain_id)
            .or_default()
            .push(Arc::new(node));
    }

    if let Some(api) = args.tenderly.api(args.http_timeout)? {
        for (chain_id, endpoints) in &mut endpoints {
            let Some(node) = endpoints.first().cloned() else {
                continue;
            };
            let tenderly = TenderlyBackend::new(
                node,
                api.clone(),
                *chain_id,
                args.tenderly.tenderly_value_format,
            );
            endpoints.push(Arc::new(tenderly) as Arc<dyn Backend>);
        }
    }

    for network in network::SUPPORTED {
        match endpoints.get(&network.chain_id) {
            Some(endpoints) => tracing::info!(network = network.name, ?endpoints, "endpoints"),
            None => tracing::warn!(network = network.name, "no endpoints configured"),
        }
    }
    Ok(endpoints)
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Kubernetes sends sigterm, whereas locally sigint (ctrl-c) is most common.
    let Ok(mut interrupt) = unix::signal(SignalKind::interrupt()) else {
        return std::future::pending().await;
    };
    let Ok(mut terminate) = unix::signal(SignalKind::terminate()) else {
        return std::future::pending().await;
    };
    tokio::select! {
        _ = interrupt.recv() => (),
        _ = terminate.recv() => (),
    };
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on Windows.
    std::future::pending().await
}

#[cfg(test)]
mod tests {
    use {super::*, registrar_gas::GasEstimate, serde_json::json};

    fn arguments(extra: &[&str]) -> Arguments {
        Arguments::parse_from(
            [
                "gas-api",
                "--bind-address",
                "127.0.0.1:0",
                "--endpoints",
                "1|https://mainnet.infura.io/v3/key,10|https://mainnet.optimism.io,\
                 1|https://web3.ens.domains/v1/mainnet|compact,11155111|http://localhost:8545",
            ]
            .into_iter()
            .chain(extra.iter().copied()),
        )
    }

    #[test]
    fn groups_endpoints_per_chain() {
        let endpoints = endpoints(&arguments(&[])).unwrap();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(
            endpoints[&1].names(),
            ["1/mainnet.infura.io", "1/web3.ens.domains"]
        );
        assert_eq!(endpoints[&11155111].names(), ["11155111/localhost"]);
    }

    #[test]
    fn appends_tenderly_per_chain() {
        let endpoints = endpoints(&arguments(&[
            "--tenderly-user",
            "ens",
            "--tenderly-project",
            "gas",
            "--tenderly-api-key",
            "key",
        ]))
        .unwrap();
        assert_eq!(
            endpoints[&1].names(),
            ["1/mainnet.infura.io", "1/web3.ens.domains", "tenderly"]
        );
        assert_eq!(
            endpoints[&11155111].names(),
            ["11155111/localhost", "tenderly"]
        );
    }

    #[tokio::test]
    async fn serves_local_estimates() {
        observe::tracing::initialize_reentrant("warn,gas_api=debug");
        let (bind, bound) = oneshot::channel();
        let server = tokio::spawn(run(arguments(&[]), Some(bind)));
        let addr = bound.await.unwrap();

        let estimate: GasEstimate = reqwest::Client::new()
            .post(format!("http://{addr}/extension"))
            .json(&json!({
                "networkId": 1337,
                "labels": ["test"],
                "duration": 31557600,
                "from": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            }))
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(estimate, GasEstimate::success(105000));
        server.abort();
    }
}
