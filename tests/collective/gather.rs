use meshcoll::{Payload, cluster::gather_order};

use super::helpers::{rank_values, run_ranks};

#[tokio::test]
async fn test_gather_to_root_0() {
    run_ranks(4, |comm| async move {
        let rank = comm.rank();
        let local = Payload::new(vec![rank as f32; 2]);
        let res = comm.gather(0, local).await.unwrap();

        if rank == 0 {
            let g = res.unwrap();
            assert_eq!(g.contributors, vec![0, 1, 3, 2]);
            assert_eq!(
                g.payload.as_slice(),
                &[0.0, 0.0, 1.0, 1.0, 3.0, 3.0, 2.0, 2.0]
            );
        } else {
            assert!(res.is_none(), "rank {rank} must not hold the gather");
        }
    })
    .await;
}

#[tokio::test]
async fn test_gather_from_nonzero_root() {
    run_ranks(7, |comm| async move {
        let rank = comm.rank();
        let res = comm.gather(5, Payload::new(vec![rank as u64])).await.unwrap();
        if rank == 5 {
            let g = res.unwrap();
            assert_eq!(g.contributors, gather_order(5, 7));
            let got: Vec<u64> = g.payload.into_vec();
            let want: Vec<u64> = g.contributors.iter().map(|&r| r as u64).collect();
            assert_eq!(got, want);
        }
    })
    .await;
}

#[tokio::test]
async fn test_gather_unequal_counts() {
    run_ranks(3, |comm| async move {
        let rank = comm.rank();
        let local = Payload::new(vec![rank as u16; rank as usize + 1]);
        let res = comm.gather(0, local).await.unwrap();

        if rank == 0 {
            let g = res.unwrap();
            assert_eq!(g.counts, vec![1, 2, 3]);
            assert_eq!(g.payload.as_slice(), &[0, 1, 1, 2, 2, 2]);
            assert_eq!(g.slot_of(2), Some(&[2, 2, 2][..]));
        } else {
            assert!(res.is_none());
        }
    })
    .await;
}

#[tokio::test]
async fn test_sorted_gather_unequal_counts() {
    run_ranks(5, |comm| async move {
        let rank = comm.rank();
        let local = rank_values(rank, 2 * rank as usize + 1);
        let res = comm.sorted_gather(2, Payload::new(local)).await.unwrap();

        if rank == 2 {
            let mut want: Vec<i32> = (0..5u32)
                .flat_map(|r| rank_values(r, 2 * r as usize + 1))
                .collect();
            want.sort();
            assert_eq!(res.unwrap().into_vec(), want);
        }
    })
    .await;
}

#[tokio::test]
async fn test_sorted_gather_matches_global_sort() {
    for world in [1u32, 2, 3, 8, 13] {
        run_ranks(world, move |comm| async move {
            let rank = comm.rank();
            let local = rank_values(rank, 9);
            let res = comm.sorted_gather(0, Payload::new(local)).await.unwrap();

            if rank == 0 {
                let mut want: Vec<i32> = (0..world).flat_map(|r| rank_values(r, 9)).collect();
                want.sort();
                assert_eq!(res.unwrap().into_vec(), want, "world {world}");
            }
        })
        .await;
    }
}

#[tokio::test]
async fn test_consecutive_gathers_do_not_mix() {
    run_ranks(5, |comm| async move {
        let rank = comm.rank();
        for round in 0..3u32 {
            let root = (round % 5) as i64;
            let res = comm
                .gather(root, Payload::new(vec![rank * 10 + round]))
                .await
                .unwrap();
            if let Some(g) = res {
                assert_eq!(g.payload.len(), 5);
                assert!(g.payload.as_slice().iter().all(|v| v % 10 == round));
            }
        }
    })
    .await;
}
