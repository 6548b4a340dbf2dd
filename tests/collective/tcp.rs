use meshcoll::{Communicator, MeshConfig, Payload, Topology, Traversal};
use std::sync::Arc;

#[tokio::test]
async fn test_tcp_sorted_gather_and_tour() {
    let comms = Communicator::tcp_local_group(4, MeshConfig::default())
        .await
        .unwrap();
    let comms: Vec<Arc<_>> = comms.into_iter().map(Arc::new).collect();

    let mut handles = Vec::new();
    for c in &comms {
        let c = Arc::clone(c);
        handles.push(tokio::spawn(async move {
            let rank = c.rank();
            let local = Payload::new(vec![10 - rank as i32, rank as i32]);
            let sorted = c.sorted_gather(0, local).await.unwrap();
            if rank == 0 {
                assert_eq!(sorted.unwrap().into_vec(), vec![0, 1, 2, 3, 7, 8, 9, 10]);
            }

            let payload = (rank == 2).then(|| Payload::new(vec![rank as u8]));
            let d = c
                .route_transfer(
                    Topology::line(4).unwrap(),
                    Traversal::PointToPoint { src: 2, dst: 0 },
                    payload,
                )
                .await
                .unwrap();
            if rank == 0 {
                assert_eq!(d.unwrap().trail.as_slice(), &[2, 1, 0]);
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
}
