//! # Permission Gate
//!
//! Wraps any channel with a mutable permission state. Deliveries only pass
//! through while the state is `Granted`; the state only changes through an
//! explicit `request_capability` call or `set_capability`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use async_trait::async_trait;
use log::{debug, info};
use std::sync::{Arc, RwLock};

use super::capability::{Capability, RequestOutcome};
use super::channel::{
    CapabilityRequester, DeliveryError, Notification, NotificationChannel, PermissionPrompt,
};

pub struct PermissionGate<C> {
    inner: C,
    state: RwLock<Capability>,
    prompt: Option<Arc<dyn PermissionPrompt>>,
}

impl<C: NotificationChannel> PermissionGate<C> {
    pub fn new(inner: C, initial: Capability) -> Self {
        PermissionGate {
            inner,
            state: RwLock::new(initial),
            prompt: None,
        }
    }

    /// Attach the prompt shown when a request is made in the `Default` state
    pub fn with_prompt(mut self, prompt: Arc<dyn PermissionPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Overwrite the stored state (e.g. the user changed it in settings)
    pub fn set_capability(&self, capability: Capability) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = capability;
    }

    fn stored(&self) -> Capability {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<C: NotificationChannel> NotificationChannel for PermissionGate<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capability_state(&self) -> Capability {
        match self.inner.capability_state() {
            Capability::Unsupported => Capability::Unsupported,
            _ => self.stored(),
        }
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        match self.capability_state() {
            Capability::Granted => self.inner.deliver(notification).await,
            Capability::Unsupported => Err(DeliveryError::Unsupported),
            other => Err(DeliveryError::NotGranted(other)),
        }
    }
}

#[async_trait]
impl<C: NotificationChannel> CapabilityRequester for PermissionGate<C> {
    async fn request_capability(&self) -> RequestOutcome {
        match self.capability_state() {
            Capability::Granted => RequestOutcome::Granted,
            Capability::Unsupported | Capability::Denied => RequestOutcome::Denied,
            Capability::Default => {
                let Some(prompt) = &self.prompt else {
                    debug!("No permission prompt attached to {} channel", self.name());
                    return RequestOutcome::Denied;
                };
                let outcome = prompt.ask().await;
                self.set_capability(outcome.into());
                info!(
                    "Notification permission for {} channel: {}",
                    self.name(),
                    Capability::from(outcome)
                );
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::notifications::channel::{LogChannel, StaticPrompt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn notification() -> Notification {
        Notification {
            title: "Sleep".to_string(),
            body: "Bed time".to_string(),
            tag: "reminder-9".to_string(),
            require_interaction: true,
        }
    }

    struct CountingPrompt {
        answer: RequestOutcome,
        asked: AtomicUsize,
    }

    #[async_trait]
    impl PermissionPrompt for CountingPrompt {
        async fn ask(&self) -> RequestOutcome {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    struct UnsupportedChannel;

    #[async_trait]
    impl NotificationChannel for UnsupportedChannel {
        fn name(&self) -> &str {
            "unsupported"
        }

        fn capability_state(&self) -> Capability {
            Capability::Unsupported
        }

        async fn deliver(&self, _notification: &Notification) -> Result<(), DeliveryError> {
            Err(DeliveryError::Unsupported)
        }
    }

    #[tokio::test]
    async fn test_granted_gate_delivers() {
        let gate = PermissionGate::new(LogChannel::new(), Capability::Granted);
        assert!(gate.deliver(&notification()).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_granted_states_refuse_delivery() {
        for state in [Capability::Denied, Capability::Default] {
            let gate = PermissionGate::new(LogChannel::new(), state);
            match gate.deliver(&notification()).await {
                Err(DeliveryError::NotGranted(s)) => assert_eq!(s, state),
                other => panic!("expected NotGranted, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_request_in_default_state_prompts_once() {
        let prompt = Arc::new(CountingPrompt {
            answer: RequestOutcome::Granted,
            asked: AtomicUsize::new(0),
        });
        let gate = PermissionGate::new(LogChannel::new(), Capability::Default)
            .with_prompt(prompt.clone());

        assert_eq!(gate.request_capability().await, RequestOutcome::Granted);
        assert_eq!(gate.capability_state(), Capability::Granted);
        assert!(gate.deliver(&notification()).await.is_ok());

        // Already granted: no second prompt
        assert_eq!(gate.request_capability().await, RequestOutcome::Granted);
        assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_denied_state_never_prompts() {
        let prompt = Arc::new(CountingPrompt {
            answer: RequestOutcome::Granted,
            asked: AtomicUsize::new(0),
        });
        let gate = PermissionGate::new(LogChannel::new(), Capability::Denied)
            .with_prompt(prompt.clone());

        assert_eq!(gate.request_capability().await, RequestOutcome::Denied);
        assert_eq!(prompt.asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prompt_denial_is_remembered() {
        let gate = PermissionGate::new(LogChannel::new(), Capability::Default)
            .with_prompt(Arc::new(StaticPrompt(RequestOutcome::Denied)));
        assert_eq!(gate.request_capability().await, RequestOutcome::Denied);
        assert_eq!(gate.capability_state(), Capability::Denied);
    }

    #[tokio::test]
    async fn test_default_without_prompt_is_denied() {
        let gate = PermissionGate::new(LogChannel::new(), Capability::Default);
        assert_eq!(gate.request_capability().await, RequestOutcome::Denied);
        assert_eq!(gate.capability_state(), Capability::Default);
    }

    #[tokio::test]
    async fn test_unsupported_inner_channel_wins() {
        let gate = PermissionGate::new(UnsupportedChannel, Capability::Granted);
        assert_eq!(gate.capability_state(), Capability::Unsupported);
        assert!(matches!(
            gate.deliver(&notification()).await,
            Err(DeliveryError::Unsupported)
        ));
        assert_eq!(gate.request_capability().await, RequestOutcome::Denied);
    }
}
