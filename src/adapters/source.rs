use crate::core::framing::HexDecoder;
use crate::domain::ports::ChunkSource;
use crate::utils::error::{Result, ShelfError};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
    Text,
    /// 序列橋接交出的 hex 字串
    Hex,
}

/// 從任意 `AsyncRead` (裝置節點、檔案、stdin) 讀資料，原樣切塊送進佇列
pub struct ReaderSource<R> {
    reader: R,
    chunk_bytes: usize,
    decoder: Option<HexDecoder>,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R, chunk_bytes: usize, encoding: InputEncoding) -> Self {
        Self {
            reader,
            chunk_bytes: chunk_bytes.max(1),
            decoder: match encoding {
                InputEncoding::Text => None,
                InputEncoding::Hex => Some(HexDecoder::new()),
            },
        }
    }
}

/// 打開輸入來源；`-` 代表 stdin。打不開屬於傳輸層錯誤
pub async fn open_input(path: &str) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    if path == "-" {
        return Ok(Box::new(tokio::io::stdin()));
    }

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ShelfError::TransportError {
            message: format!("cannot open {}: {}", path, e),
        })?;
    Ok(Box::new(file))
}

#[async_trait]
impl<R> ChunkSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn pump(&mut self, sink: UnboundedSender<Vec<u8>>) -> Result<u64> {
        let mut buf = vec![0u8; self.chunk_bytes];
        let mut pushed = 0u64;

        loop {
            let n = self
                .reader
                .read(&mut buf)
                .await
                .map_err(|e| ShelfError::TransportError {
                    message: format!("read failed: {}", e),
                })?;
            if n == 0 {
                break;
            }

            let chunk = match self.decoder.as_mut() {
                Some(decoder) => decoder.decode(&buf[..n]),
                None => buf[..n].to_vec(),
            };
            if chunk.is_empty() {
                continue;
            }

            if sink.send(chunk).is_err() {
                tracing::debug!("Chunk queue closed, stopping source");
                break;
            }
            pushed += 1;
        }

        Ok(pushed)
    }
}
