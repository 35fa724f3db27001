use std::{
    net::SocketAddr,
    sync::{Arc, OnceLock},
};

use hickory_resolver::{
    Resolver, TokioResolver, config::ResolverConfig, name_server::TokioConnectionProvider,
};
use log::warn;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};

/// Resolver of the shared client, Cloudflare when the system configuration
/// cannot be read.
#[derive(Debug, Default, Clone)]
pub struct DoHResolver {
    state: Arc<OnceLock<TokioResolver>>,
}

impl DoHResolver {
    fn build_resolver() -> TokioResolver {
        match Resolver::builder(TokioConnectionProvider::default()) {
            Ok(builder) => builder.build(),
            Err(err) => {
                warn!("[dns] system resolver config unavailable, using cloudflare: {err}");
                Resolver::builder_with_config(
                    ResolverConfig::cloudflare(),
                    TokioConnectionProvider::default(),
                )
                .build()
            }
        }
    }
}

impl Resolve for DoHResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let state = self.state.clone();

        Box::pin(async move {
            let resolver = state.get_or_init(DoHResolver::build_resolver);
            let lookup = resolver.lookup_ip(name.as_str()).await?;

            let addrs: Addrs = Box::new(lookup.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok(addrs)
        })
    }
}
