pub(crate) mod communication;

pub use communication::CommunicationEntity;
