//! Call-signaling relay.
//!
//! Stateless pairwise routing: each event names a target user and is
//! forwarded to that user's current connection with the caller's identity
//! attached. The relay keeps no call session state and enforces no
//! handshake ordering; the implicit state machine (idle, requested,
//! accepted/declined, connected) lives entirely in the two clients.
//! Adding server-side enforcement here would diverge from the contract.

use std::sync::Arc;

use ripple_protocol::{
    CallAcceptNotice, CallAnswer, CallAnswerNotice, CallOffer, CallOfferNotice, CallRequest,
    CallRequestNotice, CallTarget, CandidateNotice, DeclineNotice, IceCandidate, ServerEvent,
};

use crate::emit::Emitter;
use crate::registry::{Identity, Registry};

/// Relay for `call:*`, `decline:call`, and `ice:candidate` events.
pub struct CallRelay {
    registry: Arc<Registry>,
}

impl CallRelay {
    /// Create a new call relay.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Ring the target user.
    pub fn request(&self, emitter: &dyn Emitter, caller: &Identity, request: CallRequest) {
        self.route(
            emitter,
            &request.id,
            ServerEvent::CallRequest(CallRequestNotice {
                id: caller.id.clone(),
                username: caller.display_name.clone(),
                call_type: request.call_type,
            }),
        );
    }

    /// Notify the original caller that the ring was accepted.
    pub fn accept_request(&self, emitter: &dyn Emitter, accepter: &Identity, target: CallTarget) {
        self.route(
            emitter,
            &target.id,
            ServerEvent::CallRequestAccept(CallAcceptNotice {
                id: accepter.id.clone(),
                username: accepter.display_name.clone(),
            }),
        );
    }

    /// Notify the original caller that the ring was declined.
    pub fn decline(&self, emitter: &dyn Emitter, decliner: &Identity, target: CallTarget) {
        self.route(
            emitter,
            &target.id,
            ServerEvent::DeclineCall(DeclineNotice {
                username: decliner.display_name.clone(),
            }),
        );
    }

    /// Forward an SDP offer to the peer.
    pub fn offer(&self, emitter: &dyn Emitter, caller: &Identity, offer: CallOffer) {
        self.route(
            emitter,
            &offer.id,
            ServerEvent::CallOffer(CallOfferNotice {
                offer: offer.offer,
                id: caller.id.clone(),
            }),
        );
    }

    /// Forward an SDP answer to the peer.
    pub fn answer(&self, emitter: &dyn Emitter, answer: CallAnswer) {
        self.route(
            emitter,
            &answer.id,
            ServerEvent::CallAnswer(CallAnswerNotice {
                answer: answer.answer,
            }),
        );
    }

    /// Forward an ICE candidate to the peer. Routes even without a
    /// preceding request/accept handshake.
    pub fn candidate(&self, emitter: &dyn Emitter, candidate: IceCandidate) {
        self.route(
            emitter,
            &candidate.id,
            ServerEvent::IceCandidate(CandidateNotice {
                candidate: candidate.candidate,
            }),
        );
    }

    fn route(&self, emitter: &dyn Emitter, target_user: &str, event: ServerEvent) {
        if let Some(conn) = self.registry.connection_of(target_user) {
            emitter.emit(&conn, event);
        }
    }
}
