use meshcoll::{Communicator, DynChannel, MeshConfig};
use std::sync::Arc;

/// Helper: run the same closure on every rank of an in-process group.
/// Keeps all communicators alive until every task completes.
pub async fn run_ranks<F, Fut>(world_size: u32, f: F)
where
    F: Fn(Arc<Communicator<DynChannel>>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    run_ranks_with(world_size, MeshConfig::default(), f).await;
}

/// [`run_ranks`] with an explicit config.
pub async fn run_ranks_with<F, Fut>(world_size: u32, config: MeshConfig, f: F)
where
    F: Fn(Arc<Communicator<DynChannel>>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let comms = Communicator::local_group(world_size, config).unwrap();
    let comms: Vec<Arc<Communicator<DynChannel>>> = comms.into_iter().map(Arc::new).collect();

    let f = Arc::new(f);
    let mut handles = Vec::new();
    for c in &comms {
        let c = Arc::clone(c);
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move { f(c).await }));
    }
    for h in handles {
        h.await.unwrap();
    }
}

/// Deterministic per-rank test data in `[-50, 50)`.
pub fn rank_values(rank: u32, count: usize) -> Vec<i32> {
    let mut state = rank.wrapping_mul(0x9e37_79b9).wrapping_add(1);
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 100) as i32 - 50
        })
        .collect()
}
