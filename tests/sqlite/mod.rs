#![cfg(feature = "rusqlite")]

mod update;
