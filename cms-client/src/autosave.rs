//! Отложенное автосохранение деталей медиа-ассета.
//!
//! У каждого поля свой таймер: правка поля перезапускает только его таймер,
//! поэтому правки разных полей в пределах секунды сохраняются обе.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cms_core::{DetailField, MediaAsset};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::CmsClientResult;

/// Пауза после последней правки поля перед сохранением.
pub const DEFAULT_DEBOUNCE: Duration = cms_core::media::DETAIL_SAVE_DELAY;

#[async_trait]
/// Куда сохраняется одно поле деталей ассета.
pub trait DetailSink: Send + Sync + 'static {
    /// Сохраняет одно поле и возвращает обновлённый ассет.
    async fn save_detail(
        &self,
        asset_id: &str,
        field: DetailField,
        value: &str,
    ) -> CmsClientResult<MediaAsset>;
}

#[derive(Debug, Clone, PartialEq)]
/// Итог фонового сохранения поля.
pub enum AutoSaveOutcome {
    /// Поле сохранено.
    Saved {
        /// Какое поле.
        field: DetailField,
        /// Ассет после сохранения.
        asset: Box<MediaAsset>,
    },
    /// Сохранить не удалось; локальное значение не откатывается.
    Failed {
        /// Какое поле.
        field: DetailField,
        /// Текст ошибки для пользователя.
        message: String,
    },
}

struct Pending {
    handle: JoinHandle<()>,
    value: String,
}

/// Автосохранение деталей одного ассета.
pub struct DetailAutoSaver<S: DetailSink> {
    sink: Arc<S>,
    asset_id: String,
    delay: Duration,
    pending: HashMap<DetailField, Pending>,
    outcomes: mpsc::UnboundedSender<AutoSaveOutcome>,
}

impl<S: DetailSink> DetailAutoSaver<S> {
    /// Создаёт автосохранение и канал, в который приходят его итоги.
    pub fn new(
        sink: Arc<S>,
        asset_id: impl Into<String>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<AutoSaveOutcome>) {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        let saver = Self {
            sink,
            asset_id: asset_id.into(),
            delay,
            pending: HashMap::new(),
            outcomes,
        };
        (saver, receiver)
    }

    /// Ассет, детали которого сохраняются.
    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    /// Регистрирует правку поля и перезапускает его таймер.
    pub fn edit(&mut self, field: DetailField, value: impl Into<String>) {
        let value = value.into();
        if let Some(previous) = self.pending.remove(&field) {
            previous.handle.abort();
        }

        let sink = Arc::clone(&self.sink);
        let asset_id = self.asset_id.clone();
        let outcomes = self.outcomes.clone();
        let delay = self.delay;
        let task_value = value.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = save(sink.as_ref(), &asset_id, field, &task_value).await;
            let _ = outcomes.send(outcome);
        });

        self.pending.insert(field, Pending { handle, value });
    }

    /// Поля, чьё сохранение ещё не завершилось.
    pub fn pending_fields(&self) -> Vec<DetailField> {
        let mut fields: Vec<_> = self
            .pending
            .iter()
            .filter(|(_, pending)| !pending.handle.is_finished())
            .map(|(field, _)| *field)
            .collect();
        fields.sort();
        fields
    }

    /// Немедленно сохраняет все поля, которые ещё ждут таймера.
    pub async fn flush(&mut self) -> Vec<AutoSaveOutcome> {
        let mut drained: Vec<_> = self.pending.drain().collect();
        drained.sort_by_key(|(field, _)| *field);

        let mut results = Vec::new();
        for (field, pending) in drained {
            if pending.handle.is_finished() {
                continue;
            }
            pending.handle.abort();
            results.push(save(self.sink.as_ref(), &self.asset_id, field, &pending.value).await);
        }
        results
    }

    /// Отменяет все ожидающие сохранения.
    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }
}

impl<S: DetailSink> Drop for DetailAutoSaver<S> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn save<S: DetailSink + ?Sized>(
    sink: &S,
    asset_id: &str,
    field: DetailField,
    value: &str,
) -> AutoSaveOutcome {
    match sink.save_detail(asset_id, field, value).await {
        Ok(asset) => {
            debug!(asset_id, %field, "media detail saved");
            AutoSaveOutcome::Saved {
                field,
                asset: Box::new(asset),
            }
        }
        Err(err) => {
            warn!(asset_id, %field, error = %err, "media detail save failed");
            AutoSaveOutcome::Failed {
                field,
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use cms_core::MediaType;

    use super::*;
    use crate::error::CmsClientError;

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(DetailField, String)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn calls(&self) -> Vec<(DetailField, String)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl DetailSink for RecordingSink {
        async fn save_detail(
            &self,
            asset_id: &str,
            field: DetailField,
            value: &str,
        ) -> CmsClientResult<MediaAsset> {
            self.calls
                .lock()
                .expect("lock")
                .push((field, value.to_string()));
            if self.fail {
                return Err(CmsClientError::NotFound);
            }

            let mut asset = MediaAsset {
                id: asset_id.to_string(),
                url: "/uploads/a.png".to_string(),
                name: "a.png".to_string(),
                media_type: MediaType::Image,
                format: "png".to_string(),
                size: 1,
                dimensions: None,
                uploaded_by: String::new(),
                usage_count: 0,
                title: String::new(),
                alt_text: String::new(),
                caption: String::new(),
                description: String::new(),
                created_at: None,
            };
            asset.set_detail(field, value);
            Ok(asset)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn different_fields_within_debounce_both_persist() {
        let sink = Arc::new(RecordingSink::default());
        let (mut saver, mut outcomes) =
            DetailAutoSaver::new(Arc::clone(&sink), "img-1", DEFAULT_DEBOUNCE);

        saver.edit(DetailField::Title, "Sunset");
        tokio::time::sleep(Duration::from_millis(300)).await;
        saver.edit(DetailField::Caption, "Over the sea");

        let first = outcomes.recv().await.expect("first outcome");
        let second = outcomes.recv().await.expect("second outcome");
        assert!(matches!(first, AutoSaveOutcome::Saved { field: DetailField::Title, .. }));
        assert!(matches!(second, AutoSaveOutcome::Saved { field: DetailField::Caption, .. }));

        assert_eq!(
            sink.calls(),
            vec![
                (DetailField::Title, "Sunset".to_string()),
                (DetailField::Caption, "Over the sea".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_edits_of_one_field_save_last_value_once() {
        let sink = Arc::new(RecordingSink::default());
        let (mut saver, mut outcomes) =
            DetailAutoSaver::new(Arc::clone(&sink), "img-1", DEFAULT_DEBOUNCE);

        saver.edit(DetailField::AltText, "c");
        tokio::time::sleep(Duration::from_millis(400)).await;
        saver.edit(DetailField::AltText, "ca");
        tokio::time::sleep(Duration::from_millis(400)).await;
        saver.edit(DetailField::AltText, "cat");

        let outcome = outcomes.recv().await.expect("outcome");
        match outcome {
            AutoSaveOutcome::Saved { field, asset } => {
                assert_eq!(field, DetailField::AltText);
                assert_eq!(asset.alt_text, "cat");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.calls(), vec![(DetailField::AltText, "cat".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_saves_pending_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let (mut saver, _outcomes) =
            DetailAutoSaver::new(Arc::clone(&sink), "img-1", DEFAULT_DEBOUNCE);

        saver.edit(DetailField::Description, "long text");
        assert_eq!(saver.pending_fields(), vec![DetailField::Description]);

        let results = saver.flush().await;
        assert_eq!(results.len(), 1);
        assert!(saver.pending_fields().is_empty());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_drops_pending_edits() {
        let sink = Arc::new(RecordingSink::default());
        let (mut saver, _outcomes) =
            DetailAutoSaver::new(Arc::clone(&sink), "img-1", DEFAULT_DEBOUNCE);

        saver.edit(DetailField::Title, "x");
        saver.cancel_all();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(sink.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_reported_not_retried() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let (mut saver, mut outcomes) =
            DetailAutoSaver::new(Arc::clone(&sink), "img-1", DEFAULT_DEBOUNCE);

        saver.edit(DetailField::Caption, "x");
        let outcome = outcomes.recv().await.expect("outcome");
        assert!(matches!(outcome, AutoSaveOutcome::Failed { field: DetailField::Caption, .. }));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.calls().len(), 1);
    }
}
