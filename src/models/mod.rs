pub mod association;
pub mod conversation;
pub mod message;
pub mod offer;
pub mod theme;
pub mod user;

pub use association::{Association, AssociationCategory, AssociationChanges, NewAssociation};
pub use conversation::{ConversationSummary, Delivery, ThreadMessage};
pub use message::{Message, ParticipantInfo, ParticipantType, SendMessageRequest, Viewer};
pub use offer::{NewOffer, Offer, OfferDecision, OfferDonor, OfferStatus, OfferStatusUpdate};
pub use theme::Theme;
pub use user::{NewUser, User, UserChanges, UserType};
