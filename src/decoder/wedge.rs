//! Keyboard-wedge decoder
//!
//! Handheld barcode readers present themselves as keyboards and "type" each
//! payload followed by Enter. This decoder turns such lines into decode
//! attempts. It does not look at the bound video source.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{DecodeAttempt, DecodeStream, DecoderError, DecoderFactory, DecoderOptions, QrDecoder};
use crate::camera::VideoSource;

/// Factory for decoders fed from a shared line feed
#[derive(Clone)]
pub struct WedgeDecoderFactory {
    feed: broadcast::Sender<String>,
}

impl WedgeDecoderFactory {
    pub fn new(capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(capacity.max(1));
        Self { feed }
    }

    /// Sender for scanned lines; each started decoder sees lines sent after
    /// it was started
    pub fn feed(&self) -> broadcast::Sender<String> {
        self.feed.clone()
    }
}

impl DecoderFactory for WedgeDecoderFactory {
    fn bind(&self, _source: Arc<dyn VideoSource>, options: DecoderOptions) -> Box<dyn QrDecoder> {
        log::trace!("Binding wedge decoder with {:?}", options);
        Box::new(WedgeDecoder {
            feed: self.feed.clone(),
            destroyed: false,
        })
    }
}

struct WedgeDecoder {
    feed: broadcast::Sender<String>,
    destroyed: bool,
}

#[async_trait]
impl QrDecoder for WedgeDecoder {
    async fn start(&mut self) -> Result<DecodeStream, DecoderError> {
        if self.destroyed {
            return Err(DecoderError::Destroyed);
        }

        let lines = self.feed.subscribe();
        let attempts = stream::unfold(lines, |mut lines| async move {
            loop {
                match lines.recv().await {
                    Ok(line) => {
                        let text = line.trim_end_matches(['\r', '\n']).to_string();
                        let attempt = if text.is_empty() {
                            DecodeAttempt::Empty
                        } else {
                            DecodeAttempt::found(text)
                        };
                        return Some((attempt, lines));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Scanner input lagged; dropped {} line(s)", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(attempts.boxed())
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::VideoElement;

    #[tokio::test]
    async fn test_lines_become_attempts() {
        let factory = WedgeDecoderFactory::new(8);
        let mut decoder = factory.bind(Arc::new(VideoElement::new()), DecoderOptions::detailed());
        let mut attempts = decoder.start().await.unwrap();

        let feed = factory.feed();
        feed.send("山田花子.54321\r\n".to_string()).unwrap();
        feed.send(String::new()).unwrap();

        assert_eq!(attempts.next().await, Some(DecodeAttempt::found("山田花子.54321")));
        assert_eq!(attempts.next().await, Some(DecodeAttempt::Empty));
    }

    #[tokio::test]
    async fn test_stream_ends_when_feed_closes() {
        let factory = WedgeDecoderFactory::new(8);
        let mut decoder = factory.bind(Arc::new(VideoElement::new()), DecoderOptions::default());
        let mut attempts = decoder.start().await.unwrap();

        drop(decoder);
        drop(factory);

        assert_eq!(attempts.next().await, None);
    }

    #[tokio::test]
    async fn test_destroyed_decoder_cannot_start() {
        let factory = WedgeDecoderFactory::new(8);
        let mut decoder = factory.bind(Arc::new(VideoElement::new()), DecoderOptions::default());

        decoder.destroy();
        decoder.destroy();

        assert_eq!(decoder.start().await.err(), Some(DecoderError::Destroyed));
    }
}
