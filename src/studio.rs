//! Actor that owns the [`Controller`]: intents come in on one channel, finished
//! service calls on another, and a fresh [`SessionView`] is published after
//! every transition.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::codec::ImagePayload;
use crate::controller::{Controller, RefineTicket, SessionView, StylizeTicket};
use crate::error::StudioError;
use crate::service::{GenerationResult, ImageService};

#[derive(Debug)]
pub enum Intent {
    /// Replies whether the read may start; false while another one is running.
    BeginUpload(oneshot::Sender<bool>),
    Upload(ImagePayload),
    AbortUpload,
    SelectStyle(String),
    SendMessage(String),
    StartOver,
}

impl Intent {
    fn name(&self) -> &'static str {
        match self {
            Intent::BeginUpload(_) => "begin_upload",
            Intent::Upload(_) => "upload",
            Intent::AbortUpload => "abort_upload",
            Intent::SelectStyle(_) => "select_style",
            Intent::SendMessage(_) => "send_message",
            Intent::StartOver => "start_over",
        }
    }
}

enum Completion {
    Stylized(StylizeTicket, Result<GenerationResult, StudioError>),
    Refined(RefineTicket, Result<GenerationResult, StudioError>),
}

#[derive(Clone)]
pub struct StudioHandle {
    intents: mpsc::Sender<Intent>,
    view: watch::Receiver<SessionView>,
}

impl StudioHandle {
    pub async fn send(&self, intent: Intent) -> Result<()> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| anyhow!("studio has stopped"))
    }

    /// Non-blocking send for callers outside the runtime, like the render loop.
    pub fn dispatch(&self, intent: Intent) -> Result<()> {
        self.intents.try_send(intent).map_err(|e| match e {
            TrySendError::Full(_) => anyhow!("studio is busy, try again"),
            TrySendError::Closed(_) => anyhow!("studio has stopped"),
        })
    }

    pub async fn begin_upload(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(Intent::BeginUpload(tx)).await?;
        rx.await.map_err(|_| anyhow!("studio has stopped"))
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    pub fn snapshot(&self) -> SessionView {
        self.view.borrow().clone()
    }
}

pub struct Studio {
    controller: Controller,
    service: Arc<dyn ImageService>,
    intents: mpsc::Receiver<Intent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    view_tx: watch::Sender<SessionView>,
}

impl Studio {
    pub fn spawn(service: Arc<dyn ImageService>) -> (StudioHandle, JoinHandle<()>) {
        let controller = Controller::new();
        let (intents_tx, intents_rx) = mpsc::channel(32);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(controller.view());

        let studio = Studio {
            controller,
            service,
            intents: intents_rx,
            completions_tx,
            completions_rx,
            view_tx,
        };
        let handle = tokio::spawn(studio.run());
        (
            StudioHandle {
                intents: intents_tx,
                view: view_rx,
            },
            handle,
        )
    }

    async fn run(mut self) {
        info!("studio started");
        loop {
            tokio::select! {
                biased;
                intent = self.intents.recv() => match intent {
                    Some(intent) => self.handle_intent(intent),
                    None => break,
                },
                Some(done) = self.completions_rx.recv() => self.handle_completion(done),
            }
            self.view_tx.send_replace(self.controller.view());
        }
        info!("studio stopped");
    }

    fn handle_intent(&mut self, intent: Intent) {
        debug!(
            intent = intent.name(),
            session = %self.controller.session(),
            phase = ?self.controller.phase(),
            "intent"
        );
        match intent {
            Intent::BeginUpload(reply) => {
                let accepted = self.controller.begin_upload();
                if !accepted {
                    debug!("upload refused, another read is in progress");
                }
                let _ = reply.send(accepted);
            }
            Intent::Upload(image) => self.controller.upload(image),
            Intent::AbortUpload => self.controller.abort_upload(),
            Intent::StartOver => self.controller.start_over(),
            Intent::SelectStyle(style) => {
                let Some(ticket) = self.controller.begin_stylize(&style) else {
                    return;
                };
                let service = self.service.clone();
                let tx = self.completions_tx.clone();
                tokio::spawn(async move {
                    let outcome = service.stylize(&ticket.original, &ticket.style).await;
                    let _ = tx.send(Completion::Stylized(ticket, outcome));
                });
            }
            Intent::SendMessage(text) => {
                let Some(ticket) = self.controller.begin_refine(&text) else {
                    return;
                };
                let service = self.service.clone();
                let tx = self.completions_tx.clone();
                tokio::spawn(async move {
                    let outcome = service.refine(&ticket.current, &ticket.instruction).await;
                    let _ = tx.send(Completion::Refined(ticket, outcome));
                });
            }
        }
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Stylized(ticket, outcome) => {
                self.controller.finish_stylize(ticket, outcome);
            }
            Completion::Refined(ticket, outcome) => {
                self.controller.finish_refine(ticket, outcome);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Sender;
    use crate::controller::Phase;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Replays scripted outcomes in order, optionally waiting on a gate first.
    #[derive(Default)]
    struct ScriptedService {
        outcomes: Mutex<VecDeque<Result<GenerationResult, StudioError>>>,
        calls: Mutex<Vec<String>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedService {
        fn new(outcomes: Vec<Result<GenerationResult, StudioError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                ..Default::default()
            }
        }

        async fn next(&self, call: String) -> Result<GenerationResult, StudioError> {
            self.calls.lock().unwrap().push(call);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StudioError::GenerationFailed("script exhausted".into())))
        }
    }

    #[async_trait]
    impl ImageService for ScriptedService {
        async fn stylize(&self, _original: &ImagePayload, style: &str) -> Result<GenerationResult, StudioError> {
            self.next(format!("stylize:{style}")).await
        }

        async fn refine(&self, _current: &ImagePayload, instruction: &str) -> Result<GenerationResult, StudioError> {
            self.next(format!("refine:{instruction}")).await
        }
    }

    fn ok(data: &str, text: &str) -> Result<GenerationResult, StudioError> {
        Ok(GenerationResult {
            image: ImagePayload::new(data, "image/png"),
            text: text.to_string(),
        })
    }

    async fn wait_until(handle: &StudioHandle, pred: impl FnMut(&SessionView) -> bool) -> SessionView {
        let mut rx = handle.subscribe();
        let view = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("timed out waiting for view")
            .expect("studio dropped")
            .clone();
        view
    }

    #[tokio::test]
    async fn upload_style_and_refine_round() {
        let service = Arc::new(ScriptedService::new(vec![
            ok("GEN1", "Welcome to your new room"),
            ok("GEN2", "Done! [Lamp](https://shop/lamp)"),
        ]));
        let (handle, _task) = Studio::spawn(service.clone());

        assert!(handle.begin_upload().await.unwrap());
        handle
            .send(Intent::Upload(ImagePayload::new("T1JJRw==", "image/jpeg")))
            .await
            .unwrap();
        handle.send(Intent::SelectStyle("Coastal".into())).await.unwrap();
        let view = wait_until(&handle, |v| v.phase == Phase::Styled).await;
        assert_eq!(view.transcript.len(), 1);
        assert_eq!(view.generated.as_ref().unwrap().data, "GEN1");

        handle.send(Intent::SendMessage("add a lamp".into())).await.unwrap();
        let view = wait_until(&handle, |v| v.phase == Phase::Styled && v.transcript.len() == 3).await;
        assert_eq!(view.transcript[1].sender, Sender::User);
        assert_eq!(view.transcript[2].text, "Done! [Lamp](https://shop/lamp)");
        assert_eq!(view.generated.as_ref().unwrap().data, "GEN2");

        assert_eq!(
            *service.calls.lock().unwrap(),
            vec!["stylize:Coastal".to_string(), "refine:add a lamp".to_string()]
        );
    }

    #[tokio::test]
    async fn refine_failure_is_reported_in_chat() {
        let service = Arc::new(ScriptedService::new(vec![
            ok("GEN1", "Hi"),
            Err(StudioError::RefinementFailed("Failed to refine image.".into())),
        ]));
        let (handle, _task) = Studio::spawn(service);

        handle
            .send(Intent::Upload(ImagePayload::new("T1JJRw==", "image/jpeg")))
            .await
            .unwrap();
        handle.send(Intent::SelectStyle("Industrial".into())).await.unwrap();
        wait_until(&handle, |v| v.phase == Phase::Styled).await;

        handle.send(Intent::SendMessage("add a piano".into())).await.unwrap();
        let view = wait_until(&handle, |v| v.transcript.len() == 3 && !v.refining).await;
        assert_eq!(view.last_error.as_deref(), Some("Failed to refine image."));
        assert!(view.transcript[2].text.contains("Failed to refine image."));
        assert_eq!(view.generated.as_ref().unwrap().data, "GEN1");
    }

    #[tokio::test]
    async fn second_style_while_generating_is_ignored() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService {
            gate: Some(gate.clone()),
            ..ScriptedService::new(vec![ok("GEN1", "first")])
        });
        let (handle, _task) = Studio::spawn(service.clone());

        handle
            .send(Intent::Upload(ImagePayload::new("T1JJRw==", "image/jpeg")))
            .await
            .unwrap();
        handle.send(Intent::SelectStyle("Coastal".into())).await.unwrap();
        wait_until(&handle, |v| v.phase == Phase::Generating).await;
        handle.send(Intent::SelectStyle("Farmhouse".into())).await.unwrap();
        gate.notify_one();

        let view = wait_until(&handle, |v| v.phase == Phase::Styled).await;
        assert_eq!(view.active_style.as_deref(), Some("Coastal"));
        assert_eq!(*service.calls.lock().unwrap(), vec!["stylize:Coastal".to_string()]);
    }

    #[tokio::test]
    async fn start_over_publishes_initial_view() {
        let service = Arc::new(ScriptedService::new(vec![ok("GEN1", "hi")]));
        let (handle, _task) = Studio::spawn(service);

        handle
            .send(Intent::Upload(ImagePayload::new("T1JJRw==", "image/jpeg")))
            .await
            .unwrap();
        handle.send(Intent::SelectStyle("Scandinavian".into())).await.unwrap();
        wait_until(&handle, |v| v.phase == Phase::Styled).await;

        handle.send(Intent::StartOver).await.unwrap();
        let view = wait_until(&handle, |v| v.phase == Phase::Empty).await;
        assert!(view.original.is_none());
        assert!(view.generated.is_none());
        assert!(view.active_style.is_none());
        assert!(view.transcript.is_empty());
        assert!(!view.generating && !view.refining);
        assert!(view.last_error.is_none());
    }

    #[tokio::test]
    async fn late_stylize_after_start_over_is_dropped() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService {
            gate: Some(gate.clone()),
            ..ScriptedService::new(vec![ok("STALE", "too late"), ok("FRESH", "second look")])
        });
        let (handle, _task) = Studio::spawn(service.clone());

        handle
            .send(Intent::Upload(ImagePayload::new("T1JJRw==", "image/jpeg")))
            .await
            .unwrap();
        handle.send(Intent::SelectStyle("Bohemian".into())).await.unwrap();
        wait_until(&handle, |v| v.phase == Phase::Generating).await;

        handle.send(Intent::StartOver).await.unwrap();
        wait_until(&handle, |v| v.phase == Phase::Empty).await;
        gate.notify_one();

        // Let the released call finish and its completion reach the studio.
        tokio::time::timeout(Duration::from_secs(5), async {
            while service.outcomes.lock().unwrap().len() != 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let view = handle.snapshot();
        assert_eq!(view.phase, Phase::Empty);
        assert!(view.generated.is_none());
        assert!(view.transcript.is_empty());
        assert!(view.active_style.is_none());

        handle
            .send(Intent::Upload(ImagePayload::new("T1JJRw==", "image/jpeg")))
            .await
            .unwrap();
        handle.send(Intent::SelectStyle("Coastal".into())).await.unwrap();
        gate.notify_one();
        let view = wait_until(&handle, |v| v.phase == Phase::Styled).await;
        assert_eq!(view.generated.as_ref().unwrap().data, "FRESH");
        assert_eq!(view.transcript.len(), 1);
        assert_eq!(view.transcript[0].text, "second look");
    }

    #[tokio::test]
    async fn concurrent_upload_is_refused() {
        let (handle, _task) = Studio::spawn(Arc::new(ScriptedService::default()));

        assert!(handle.begin_upload().await.unwrap());
        assert!(!handle.begin_upload().await.unwrap());
        assert_eq!(handle.snapshot().phase, Phase::Uploading);

        handle.dispatch(Intent::AbortUpload).unwrap();
        wait_until(&handle, |v| v.phase == Phase::Empty).await;
        assert!(handle.begin_upload().await.unwrap());
    }
}
