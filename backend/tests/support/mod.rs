#![allow(unused_imports)]

pub mod stubs;

pub use stubs::{
    Event, Journal, StubDocuments, StubMessenger, StubProvider, StubSource, StubStorage,
    FOLDER_ID, TEMPLATE_ID,
};
