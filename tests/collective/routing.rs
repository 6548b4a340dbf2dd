use meshcoll::{Payload, Topology, Traversal, compute_route};

use super::helpers::run_ranks;

#[tokio::test]
async fn test_ring_tour_visits_every_rank() {
    run_ranks(6, |comm| async move {
        let rank = comm.rank();
        let topo = Topology::ring(6).unwrap();
        let payload = (rank == 0).then(|| Payload::new(vec![1u8, 2, 3]));
        let res = comm
            .route_transfer(topo, Traversal::Tour { start: 0 }, payload)
            .await
            .unwrap();
        if rank == 0 {
            let d = res.unwrap();
            assert_eq!(d.trail.as_slice(), &[0, 1, 2, 3, 4, 5, 0]);
            assert_eq!(d.payload.as_slice(), &[1, 2, 3]);
        } else {
            assert!(res.is_none());
        }
    })
    .await;
}

#[tokio::test]
async fn test_hypercube_transfer_records_route() {
    run_ranks(64, |comm| async move {
        let rank = comm.rank();
        let topo = Topology::hypercube(64).unwrap();
        let payload = (rank == 0).then(|| Payload::new(vec![0xdead_beefu32]));
        let res = comm
            .route_transfer(topo, Traversal::PointToPoint { src: 0, dst: 42 }, payload)
            .await
            .unwrap();
        if rank == 42 {
            let d = res.unwrap();
            assert_eq!(d.trail.as_slice(), &[0, 32, 40, 42]);
            assert_eq!(d.payload.as_slice(), &[0xdead_beef]);
        } else {
            assert!(res.is_none());
        }
    })
    .await;
}

#[tokio::test]
async fn test_star_transfer_between_spokes() {
    run_ranks(5, |comm| async move {
        let rank = comm.rank();
        let topo = Topology::star(5).unwrap();
        let payload = (rank == 3).then(|| Payload::new(vec![-4i16]));
        let res = comm
            .route_transfer(topo, Traversal::PointToPoint { src: 3, dst: 1 }, payload)
            .await
            .unwrap();
        if rank == 1 {
            assert_eq!(res.unwrap().trail.as_slice(), &[3, 0, 1]);
        }
    })
    .await;
}

#[tokio::test]
async fn test_there_and_back_again() {
    run_ranks(8, |comm| async move {
        let rank = comm.rank();
        for topo in [
            Topology::line(8).unwrap(),
            Topology::ring(8).unwrap(),
            Topology::star(8).unwrap(),
            Topology::hypercube(8).unwrap(),
        ] {
            let (src, dst) = (6i64, 1i64);
            let out = comm
                .route_transfer(
                    topo,
                    Traversal::PointToPoint { src, dst },
                    (rank == 6).then(|| Payload::new(vec![rank as i32])),
                )
                .await
                .unwrap();

            // The destination sends the payload straight back.
            let back = comm
                .route_transfer(
                    topo,
                    Traversal::PointToPoint { src: dst, dst: src },
                    out.as_ref().map(|d| d.payload.clone()),
                )
                .await
                .unwrap();

            if rank == 6 {
                let back = back.unwrap();
                assert_eq!(back.payload.as_slice(), &[6]);
                let forward = compute_route(&topo, 6, 1).unwrap();
                if topo.kind() != meshcoll::TopologyKind::Hypercube {
                    assert_eq!(back.trail, forward.reversed(), "{topo}");
                }
                assert_eq!(back.trail.hops(), forward.hops(), "{topo}");
            }
        }
    })
    .await;
}
