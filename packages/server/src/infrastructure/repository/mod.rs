pub mod inmemory;

pub use inmemory::InMemoryHubRepository;
