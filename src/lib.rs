//! Layout and edit-history engine for an artboard design surface.
//!
//! Users place elements inside named rectangular regions ("artboards") on an
//! infinite canvas. This crate owns the interactive engine behind that: a
//! spatial index and repulsion solver that keep regions apart while they are
//! dragged, a debounced tracker that assigns elements to the region containing
//! them, an undo/redo history with merging and batched commit, and a layer
//! list that mirrors the scene graph's paint order. Rendering, hit-testing and
//! pointer delivery belong to the host; the engine talks to it only through
//! the [`scene::SceneGraph`] trait and the [`editor::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | Top-level [`editor::Editor`] wiring every component to one scene |
//! | [`doc`] | Region records, the region store, and the persisted document |
//! | [`scene`] | Scene-graph contract and the in-memory [`scene::MemoryScene`] |
//! | [`geom`] | Points and axis-aligned bounds |
//! | [`spatial`] | Uniform-grid spatial index |
//! | [`repulsion`] | Overlap repulsion and whole-layout settling |
//! | [`layout`] | Per-drag region layout controller |
//! | [`membership`] | Debounced element-to-region membership |
//! | [`history`] | Undo/redo history and its batched variant |
//! | [`workspace`] | Scene, regions, bindings and region grid kept in step |
//! | [`commands`] | Concrete undoable commands over a [`workspace::Workspace`] |
//! | [`layers`] | Derived layer list and layer operations |
//! | [`schedule`] | Id-keyed timer and animation-frame tables |
//! | [`driver`] | Tokio frame driver for a shared editor |
//! | [`config`] | Tunables with environment overrides |
//! | [`consts`] | Default numeric constants |
//! | [`error`] | Error types |

pub mod commands;
pub mod config;
pub mod consts;
pub mod doc;
pub mod driver;
pub mod editor;
pub mod error;
pub mod geom;
pub mod history;
pub mod layers;
pub mod layout;
pub mod membership;
pub mod repulsion;
pub mod scene;
pub mod schedule;
pub mod spatial;
pub mod workspace;
