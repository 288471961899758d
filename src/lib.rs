// Library root
// -----------
// Terminal front-end for an image similarity-search service. The binary
// (`main.rs`) wires these modules into an interactive menu or a one-shot
// search.
//
// Module responsibilities:
// - `config`: resolves the service address and request timeout.
// - `error`: client error taxonomy and the notices shown to the user.
// - `selection`: the currently selected image and how it is built.
// - `api`: HTTP interactions with the service behind `SimilarityService`.
// - `render`: turns service matches into the results grid model.
// - `controller`: the acquisition/submission state machine.
// - `ui`: terminal flows that drive the controller.
pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod render;
pub mod selection;
pub mod ui;
