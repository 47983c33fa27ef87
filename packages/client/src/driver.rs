//! Executes session actions against a media engine.
//!
//! The driver is the only place where a [`Session`] meets a [`MediaEngine`].
//! It runs every [`Action`] in order, turns the engine's results into
//! [`EngineEvent`]s, and feeds them back until the session has nothing left
//! to do. Frames for the relay and text for the user come out as [`Output`]s.

use std::collections::VecDeque;

use relaycast_server::infrastructure::dto::websocket::ClientEvent;

use crate::media::{EngineEvent, MediaEngine};
use crate::session::{Action, Input, Session, SessionState};

/// What the caller has to deliver after a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Send(ClientEvent),
    Status(String),
}

pub struct Driver<E: MediaEngine> {
    session: Box<dyn Session>,
    engine: E,
}

impl<E: MediaEngine> Driver<E> {
    pub fn new(session: Box<dyn Session>, engine: E) -> Self {
        Self { session, engine }
    }

    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub async fn start(&mut self) -> Vec<Output> {
        let actions = self.session.start();
        self.run(actions).await
    }

    pub async fn handle(&mut self, input: Input) -> Vec<Output> {
        let actions = self.session.handle(input);
        self.run(actions).await
    }

    /// Deliver events the engine produced on its own since the last step.
    pub async fn pump_engine(&mut self) -> Vec<Output> {
        self.run(Vec::new()).await
    }

    pub async fn close(&mut self) -> Vec<Output> {
        let actions = self.session.close();
        self.run(actions).await
    }

    async fn run(&mut self, actions: Vec<Action>) -> Vec<Output> {
        let mut queue: VecDeque<Action> = actions.into();
        let mut outputs = Vec::new();

        loop {
            while let Some(action) = queue.pop_front() {
                if let Some(event) = self.execute(action, &mut outputs).await {
                    queue.extend(self.session.handle(Input::Engine(event)));
                }
            }

            let events = self.engine.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                queue.extend(self.session.handle(Input::Engine(event)));
            }
        }

        outputs
    }

    async fn execute(&mut self, action: Action, outputs: &mut Vec<Output>) -> Option<EngineEvent> {
        match action {
            Action::Send(event) => {
                outputs.push(Output::Send(event));
                None
            }
            Action::Status(text) => {
                outputs.push(Output::Status(text));
                None
            }
            Action::Acquire { request, source } => match self.engine.acquire(&source).await {
                Ok(track) => Some(EngineEvent::Acquired { request, track }),
                Err(error) => {
                    tracing::warn!("Failed to acquire {}: {}", source, error);
                    Some(EngineEvent::AcquireFailed { request, error })
                }
            },
            Action::Release(track) => {
                self.engine.release(track).await;
                None
            }
            Action::AttachPreview(track) => {
                self.engine.attach_preview(track).await;
                None
            }
            Action::CreateOffer { peer, track } => {
                match self.engine.create_offer(&peer, track).await {
                    Ok(offer) => Some(EngineEvent::OfferCreated { peer, offer }),
                    Err(error) => Some(EngineEvent::NegotiationFailed { peer, error }),
                }
            }
            Action::AcceptOffer { peer, offer } => {
                match self.engine.accept_offer(&peer, offer).await {
                    Ok(answer) => Some(EngineEvent::AnswerCreated { peer, answer }),
                    Err(error) => Some(EngineEvent::NegotiationFailed { peer, error }),
                }
            }
            Action::ApplyAnswer { peer, answer } => {
                match self.engine.apply_answer(&peer, answer).await {
                    Ok(()) => Some(EngineEvent::RemoteDescriptionApplied { peer }),
                    Err(error) => Some(EngineEvent::NegotiationFailed { peer, error }),
                }
            }
            Action::AddCandidate { peer, candidate } => {
                if let Err(error) = self.engine.add_candidate(&peer, candidate).await {
                    tracing::warn!("Failed to add candidate for '{}': {}", peer, error);
                }
                None
            }
            Action::ReplaceVideo { peer, track } => {
                if let Err(error) = self.engine.replace_video(&peer, track).await {
                    tracing::warn!("Failed to replace video for '{}': {}", peer, error);
                }
                None
            }
            Action::ClosePeer(peer) => {
                self.engine.close_peer(&peer).await;
                None
            }
        }
    }
}
