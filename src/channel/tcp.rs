use crate::channel::Channel;
use crate::channel::mailbox::Mailbox;
use crate::error::{MeshError, Result};
use crate::protocol::{WIRE_HEADER_SIZE, WireHeader};
use crate::types::{ProcessContext, Rank, Tag};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// One rank's end of a full TCP mesh.
///
/// Every frame on a stream carries a [`WireHeader`] (`[src][tag][len]`)
/// followed by `len` bytes. A background task per peer reads frames into the
/// local inbox; sends to self skip the socket. When a peer's stream ends,
/// receives from it drain what already arrived and then fail with
/// [`MeshError::PeerDisconnected`].
pub struct TcpEndpoint {
    ctx: ProcessContext,
    writers: HashMap<Rank, Mutex<OwnedWriteHalf>>,
    inbox: Arc<Mailbox>,
    readers: Vec<tokio::task::JoinHandle<()>>,
}

impl TcpEndpoint {
    /// Bootstrap a full mesh of `world_size` endpoints over loopback.
    ///
    /// Rank `i` dials every rank `j > i` and announces itself with a 4-byte
    /// little-endian rank; rank `j` learns its peer from that announcement.
    pub async fn bootstrap_local(world_size: u32) -> Result<Vec<TcpEndpoint>> {
        if world_size == 0 {
            return Err(MeshError::transport("channel group needs at least one rank"));
        }

        let mut listeners = Vec::with_capacity(world_size as usize);
        let mut addrs: Vec<SocketAddr> = Vec::with_capacity(world_size as usize);
        for _ in 0..world_size {
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            addrs.push(listener.local_addr()?);
            listeners.push(listener);
        }

        let accepts: Vec<_> = listeners
            .into_iter()
            .enumerate()
            .map(|(j, listener)| {
                tokio::spawn(async move {
                    let mut accepted = Vec::with_capacity(j);
                    for _ in 0..j {
                        let (mut stream, _) = listener.accept().await?;
                        let mut hello = [0u8; 4];
                        stream.read_exact(&mut hello).await?;
                        stream.set_nodelay(true)?;
                        accepted.push((u32::from_le_bytes(hello), stream));
                    }
                    Ok::<_, MeshError>(accepted)
                })
            })
            .collect();

        let mut streams: Vec<Vec<(Rank, TcpStream)>> =
            (0..world_size).map(|_| Vec::new()).collect();
        for i in 0..world_size {
            for j in (i + 1)..world_size {
                let mut stream = TcpStream::connect(addrs[j as usize]).await?;
                stream.set_nodelay(true)?;
                stream.write_all(&i.to_le_bytes()).await?;
                streams[i as usize].push((j, stream));
            }
        }

        for (j, handle) in accepts.into_iter().enumerate() {
            let accepted = handle
                .await
                .map_err(|e| MeshError::transport_with_source("accept task panicked", e))??;
            streams[j].extend(accepted);
        }

        streams
            .into_iter()
            .enumerate()
            .map(|(rank, peers)| TcpEndpoint::from_streams(rank as Rank, world_size, peers))
            .collect()
    }

    /// Build an endpoint from already-connected streams, one per peer.
    ///
    /// Must be called inside a tokio runtime: a reader task is spawned per
    /// stream.
    pub fn from_streams(
        rank: Rank,
        world_size: u32,
        streams: Vec<(Rank, TcpStream)>,
    ) -> Result<Self> {
        let ctx = ProcessContext::new(rank, world_size)?;
        let inbox = Arc::new(Mailbox::new());
        let mut writers = HashMap::with_capacity(streams.len());
        let mut readers = Vec::with_capacity(streams.len());

        for (peer, stream) in streams {
            if peer >= world_size || peer == rank {
                return Err(MeshError::UnknownPeer { rank: peer });
            }
            let (reader, writer) = stream.into_split();
            writers.insert(peer, Mutex::new(writer));
            let inbox = Arc::clone(&inbox);
            readers.push(tokio::spawn(async move {
                recv_loop(rank, peer, reader, &inbox).await;
                inbox.close_source(peer).await;
            }));
        }

        Ok(Self {
            ctx,
            writers,
            inbox,
            readers,
        })
    }

    pub fn rank(&self) -> Rank {
        self.ctx.rank()
    }

    pub fn world_size(&self) -> u32 {
        self.ctx.size()
    }

    pub fn context(&self) -> ProcessContext {
        self.ctx
    }
}

impl Drop for TcpEndpoint {
    fn drop(&mut self) {
        for handle in &self.readers {
            handle.abort();
        }
    }
}

/// Read frames from one peer until the stream closes or misbehaves.
async fn recv_loop(me: Rank, peer: Rank, mut reader: OwnedReadHalf, inbox: &Mailbox) {
    loop {
        let mut raw = [0u8; WIRE_HEADER_SIZE];
        if let Err(e) = reader.read_exact(&mut raw).await {
            tracing::debug!(rank = me, peer, "tcp stream closed: {e}");
            return;
        }
        let header = WireHeader::decode(&raw);
        if header.src != peer {
            tracing::warn!(
                rank = me,
                peer,
                claimed = header.src,
                "tcp frame source does not match stream peer; dropping stream"
            );
            return;
        }
        let Ok(len) = usize::try_from(header.len) else {
            tracing::warn!(rank = me, peer, len = header.len, "tcp frame too large");
            return;
        };
        let mut data = vec![0u8; len];
        if let Err(e) = reader.read_exact(&mut data).await {
            tracing::warn!(rank = me, peer, "tcp frame truncated: {e}");
            return;
        }
        inbox.deliver(peer, header.tag, data).await;
    }
}

impl Channel for TcpEndpoint {
    fn send<'a>(&'a self, dest: Rank, tag: Tag, data: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if dest == self.rank() {
                self.inbox.deliver(dest, tag, data).await;
                return Ok(());
            }
            let writer = self
                .writers
                .get(&dest)
                .ok_or(MeshError::UnknownPeer { rank: dest })?;
            let header = WireHeader {
                src: self.rank(),
                tag,
                len: data.len() as u64,
            };
            let mut buf = Vec::with_capacity(WIRE_HEADER_SIZE + data.len());
            buf.extend_from_slice(&header.encode());
            buf.extend_from_slice(&data);

            tracing::trace!(src = self.rank(), dest, tag, bytes = data.len(), "tcp send");
            writer
                .lock()
                .await
                .write_all(&buf)
                .await
                .map_err(|e| MeshError::transport_with_source(format!("send to rank {dest}"), e))
        })
    }

    fn recv<'a>(&'a self, src: Rank, tag: Tag) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            if src >= self.world_size() {
                return Err(MeshError::UnknownPeer { rank: src });
            }
            let data = self.inbox.take(src, tag).await?;
            tracing::trace!(dest = self.rank(), src, tag, bytes = data.len(), "tcp recv");
            Ok(data)
        })
    }
}
