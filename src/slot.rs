use crate::prediction::Detection;
use parking_lot::Mutex;

/// Single-item mailbox between the streaming loop and the polling endpoint.
///
/// Holds at most the most recently published detection. Unread values are
/// overwritten, never queued.
#[derive(Debug, Default)]
pub struct LatestDetection {
    slot: Mutex<Option<Detection>>,
}

impl LatestDetection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, detection: Detection) {
        let previous = self.slot.lock().replace(detection);
        if let Some(previous) = previous {
            tracing::trace!("Discarding unread detection {:?}", previous.name);
        }
    }

    pub fn take(&self) -> Option<Detection> {
        self.slot.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn detection(name: &str) -> Detection {
        Detection {
            name: name.to_string(),
            description: format!("{} description", name),
            confidence: 0.9,
            bbox: [1, 2, 3, 4],
        }
    }

    #[test]
    fn test_take_on_empty_slot() {
        let slot = LatestDetection::new();
        assert_eq!(slot.take(), None);
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_last_writer_wins() {
        let slot = LatestDetection::new();
        slot.publish(detection("Yield"));
        slot.publish(detection("No entry"));
        slot.publish(detection("Stop"));

        assert_eq!(slot.take(), Some(detection("Stop")));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_concurrent_publish_and_take_never_tears() {
        let slot = Arc::new(LatestDetection::new());
        let names = ["Stop", "Yield", "No entry", "Keep right"];

        let writer = {
            let slot = slot.clone();
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    slot.publish(detection(names[i % names.len()]));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let slot = slot.clone();
                std::thread::spawn(move || {
                    let mut seen = 0;
                    for _ in 0..10_000 {
                        if let Some(d) = slot.take() {
                            assert_eq!(d.description, format!("{} description", d.name));
                            seen += 1;
                        }
                    }
                    seen
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
