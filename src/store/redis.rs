use super::QueueStore;
use anyhow::Result;
use delayq_redis::RedisClient;

// Redis errors pass through unwrapped so callers and logs see the server's
// own message.
#[async_trait::async_trait]
impl QueueStore for RedisClient {
    async fn list_push_tail(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.rpush(key, payload).await?;
        Ok(())
    }

    async fn list_pop_head(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lpop::<Vec<u8>>(key).await?)
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let len = self.llen(key).await?;
        Ok(len.max(0) as u64)
    }

    async fn sorted_set_add(&self, key: &str, score: i64, payload: Vec<u8>) -> Result<()> {
        self.zadd(key, payload, score).await?;
        Ok(())
    }

    async fn sorted_set_take_by_score(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<(Vec<u8>, i64)>> {
        let members = self.ztake_by_score(key, min, max).await?;

        // Scores are written as integer milliseconds
        Ok(members
            .into_iter()
            .map(|(member, score)| (member, score as i64))
            .collect())
    }

    async fn sorted_set_len(&self, key: &str) -> Result<u64> {
        let len = self.zcard(key).await?;
        Ok(len.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueueError;
    use crate::producer::Producer;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal RESP server that answers every command with `-ERR boom`
    async fn spawn_failing_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    loop {
                        let n = match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        // Each command is a RESP array header line
                        let commands = String::from_utf8_lossy(&buf[..n])
                            .split("\r\n")
                            .filter(|line| line.starts_with('*'))
                            .count();
                        for _ in 0..commands {
                            if socket.write_all(b"-ERR boom\r\n").await.is_err() {
                                return;
                            }
                        }
                    }
                });
            }
        });

        format!("redis://{}", addr)
    }

    #[tokio::test]
    async fn test_publish_surfaces_server_error_text() {
        let url = spawn_failing_server().await;
        let client = Arc::new(RedisClient::connect(&url).await.unwrap());
        let producer = Producer::new(client);

        let err = producer.publish("t", "x").await.unwrap_err();
        assert!(matches!(err, QueueError::Store(_)));
        assert!(err.to_string().contains("boom"), "got: {}", err);

        let err = producer
            .publish_delay_msg("t", "x", chrono::Duration::seconds(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_store_error_is_the_redis_error() {
        let url = spawn_failing_server().await;
        let client = RedisClient::connect(&url).await.unwrap();

        let err = client.list_pop_head("t:list").await.unwrap_err();
        let redis_err = err
            .downcast_ref::<delayq_redis::RedisError>()
            .expect("store error should be the RedisError itself");
        assert!(redis_err.to_string().contains("boom"));
    }
}
