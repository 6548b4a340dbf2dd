use meshcoll::{
    BroadcastRequest, Communicator, CountingChannel, GatherRequest, LocalEndpoint, MeshConfig,
    MeshError, Payload, RouteRequest, Topology,
};

#[tokio::test]
async fn test_gather_root_minus_one_is_rejected_without_io() {
    let eps = LocalEndpoint::group(4).unwrap();
    for ep in &eps {
        let comm = Communicator::new(CountingChannel::new(ep), ep.context(), MeshConfig::default());

        let err = comm
            .gather(-1, Payload::new(vec![1u32, 2, 3]))
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidRoot { root: -1, world_size: 4 }));
        assert!(err.is_config_error());

        let err = comm
            .sorted_gather(-1, Payload::new(vec![3i16, 1]))
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidRoot { root: -1, .. }));

        let err = comm
            .gather(0, Payload::<u8>::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::EmptyBuffer { operation: "gather" }));

        assert_eq!(comm.channel().total(), 0);
    }
}

#[tokio::test]
async fn test_configuration_errors() {
    let eps = LocalEndpoint::group(6).unwrap();
    let ctx = eps[0].context();

    assert!(matches!(
        Topology::hypercube(6),
        Err(MeshError::InvalidTopology { size: 6, .. })
    ));
    assert!(matches!(
        Topology::ring(0),
        Err(MeshError::InvalidTopology { size: 0, .. })
    ));
    assert!(matches!(
        RouteRequest::point_to_point(Topology::line(6).unwrap(), 6, 0).validate(ctx),
        Err(MeshError::InvalidEndpoint { rank: 6, .. })
    ));
    assert!(matches!(
        BroadcastRequest::new(0, 4).validate(ctx, &Payload::filled(0u8, 3)),
        Err(MeshError::BufferSizeMismatch { expected: 4, actual: 3 })
    ));
    assert!(matches!(
        GatherRequest::new(0, 0).validate(ctx, Payload::<f64>::new(vec![])),
        Err(MeshError::EmptyBuffer { operation: "gather" })
    ));
}
