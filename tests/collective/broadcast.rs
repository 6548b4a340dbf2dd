use meshcoll::{BroadcastStrategy, MeshConfig, Payload};

use super::helpers::{run_ranks, run_ranks_with};

#[tokio::test]
async fn test_broadcast_from_root_0() {
    run_ranks(3, |comm| async move {
        let rank = comm.rank();
        let mut buf = if rank == 0 {
            Payload::new(vec![42.0f32, 43.0, 44.0, 45.0])
        } else {
            Payload::filled(0.0, 4)
        };
        comm.broadcast(0, &mut buf).await.unwrap();
        assert_eq!(
            buf.as_slice(),
            &[42.0, 43.0, 44.0, 45.0],
            "rank {rank} broadcast failed"
        );
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_every_strategy_nonzero_root() {
    for strategy in [
        BroadcastStrategy::Flat,
        BroadcastStrategy::Tree,
        BroadcastStrategy::Chain,
    ] {
        let config = MeshConfig {
            broadcast: strategy,
            ..MeshConfig::default()
        };
        run_ranks_with(9, config, move |comm| async move {
            let rank = comm.rank();
            let root = 6;
            let source: Vec<i64> = vec![i64::MIN, -1, 0, 7, i64::MAX];
            let mut buf = if rank == root {
                Payload::new(source.clone())
            } else {
                Payload::filled(3, source.len())
            };
            comm.broadcast(root as i64, &mut buf).await.unwrap();
            assert_eq!(buf.as_slice(), &source[..], "{strategy:?} rank {rank}");
        })
        .await;
    }
}

#[tokio::test]
async fn test_broadcast_preserves_float_bits() {
    run_ranks(6, |comm| async move {
        let rank = comm.rank();
        let source = [f64::NAN, -0.0, f64::MIN_POSITIVE, 1e300];
        let mut buf = if rank == 1 {
            Payload::new(source.to_vec())
        } else {
            Payload::filled(0.0, 4)
        };
        comm.broadcast(1, &mut buf).await.unwrap();
        let got: Vec<u64> = buf.as_slice().iter().map(|x| x.to_bits()).collect();
        let want: Vec<u64> = source.iter().map(|x| x.to_bits()).collect();
        assert_eq!(got, want, "rank {rank}");
    })
    .await;
}
