use crate::channel::{Channel, LocalEndpoint, TcpEndpoint, Watchdog};
use crate::client::{Communicator, DynChannel};
use crate::config::MeshConfig;
use crate::error::Result;
use std::sync::Arc;

impl Communicator<DynChannel> {
    /// Bootstrap an in-process group of `world_size` ranks.
    ///
    /// Intended for tests and single-process runs: drive each communicator
    /// from its own tokio task. When `config.hang_timeout` is set every
    /// channel is wrapped in a [`Watchdog`].
    pub fn local_group(world_size: u32, config: MeshConfig) -> Result<Vec<Self>> {
        let endpoints = LocalEndpoint::group(world_size)?;
        Ok(endpoints
            .into_iter()
            .map(|ep| {
                let ctx = ep.context();
                Communicator::new(wrap(ep, &config), ctx, config.clone())
            })
            .collect())
    }

    /// Bootstrap a group of `world_size` ranks connected over loopback TCP.
    pub async fn tcp_local_group(world_size: u32, config: MeshConfig) -> Result<Vec<Self>> {
        let endpoints = TcpEndpoint::bootstrap_local(world_size).await?;
        tracing::debug!(world_size, "tcp mesh formed");
        Ok(endpoints
            .into_iter()
            .map(|ep| {
                let ctx = ep.context();
                Communicator::new(wrap(ep, &config), ctx, config.clone())
            })
            .collect())
    }
}

fn wrap<C: Channel + 'static>(channel: C, config: &MeshConfig) -> DynChannel {
    match config.hang_timeout {
        Some(limit) => Arc::new(Watchdog::new(channel, limit)),
        None => Arc::new(channel),
    }
}
