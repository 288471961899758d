// Acquisition-and-submission controller.
//
// Owns the single current selection and the view state. Acquisitions are
// numbered; a completion that belongs to an older acquisition than the
// latest one started is dropped instead of overwriting newer state.

use crate::api::SimilarityService;
use crate::error::{ClientError, Notice};
use crate::render::ResultsView;
use crate::selection::SelectedImage;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use tracing::{error, warn};

/// What the user currently sees.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Previewing(SelectedImage),
    ShowingResults {
        image: SelectedImage,
        results: ResultsView,
    },
}

/// Handle for one started acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer acquisition was started; this result was discarded.
    Stale,
}

/// A URL fetch running on a worker thread.
pub struct PendingAcquisition {
    ticket: Ticket,
    url: String,
    rx: Receiver<Result<SelectedImage, ClientError>>,
}

impl PendingAcquisition {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Block until the fetch finishes.
    pub fn wait(self) -> Result<SelectedImage, ClientError> {
        let url = self.url;
        self.rx.recv().unwrap_or_else(|_| {
            Err(ClientError::Fetch {
                url,
                reason: "fetch worker exited without a result".into(),
            })
        })
    }
}

pub struct Controller<S> {
    service: S,
    state: ViewState,
    generation: u64,
}

impl<S: SimilarityService> Controller<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: ViewState::Idle,
            generation: 0,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn selection(&self) -> Option<&SelectedImage> {
        match &self.state {
            ViewState::Idle => None,
            ViewState::Previewing(image) | ViewState::ShowingResults { image, .. } => Some(image),
        }
    }

    pub fn results(&self) -> Option<&ResultsView> {
        match &self.state {
            ViewState::ShowingResults { results, .. } => Some(results),
            _ => None,
        }
    }

    /// Start a new acquisition; any acquisition started earlier becomes
    /// stale.
    pub fn begin_acquisition(&mut self) -> Ticket {
        self.generation += 1;
        Ticket {
            generation: self.generation,
        }
    }

    /// Apply the outcome of an acquisition. A successful current
    /// acquisition replaces the selection and moves to previewing. Stale
    /// outcomes are discarded whether they succeeded or not. A failed
    /// current acquisition leaves the state untouched.
    pub fn complete_acquisition(
        &mut self,
        ticket: Ticket,
        outcome: Result<SelectedImage, ClientError>,
    ) -> Result<Completion, Notice> {
        if ticket.generation != self.generation {
            return Ok(Completion::Stale);
        }
        match outcome {
            Ok(image) => {
                self.state = ViewState::Previewing(image);
                Ok(Completion::Applied)
            }
            Err(e) => {
                warn!(error = %e, "image acquisition failed");
                Err(e.notice())
            }
        }
    }

    /// Read a local file and make it the selection.
    pub fn select_by_file(&mut self, path: &Path) -> Result<&SelectedImage, Notice> {
        let ticket = self.begin_acquisition();
        let outcome = SelectedImage::from_file(path);
        self.complete_acquisition(ticket, outcome)?;
        self.current_selection()
    }

    /// Download `url` and make it the selection.
    pub fn select_by_url(&mut self, url: &str) -> Result<&SelectedImage, Notice> {
        let ticket = self.begin_acquisition();
        let outcome = self.service.fetch_image(url);
        self.complete_acquisition(ticket, outcome)?;
        self.current_selection()
    }

    fn current_selection(&self) -> Result<&SelectedImage, Notice> {
        self.selection().ok_or(Notice::NoImageSelected)
    }

    /// Submit the current selection and show the returned matches.
    ///
    /// Without a selection this fails with `Notice::NoImageSelected` and
    /// never touches the service. On a service failure the view falls
    /// back to previewing the same image.
    pub fn submit(&mut self) -> Result<ResultsView, Notice> {
        let image = match self.selection() {
            Some(image) => image.clone(),
            None => return Err(ClientError::NoImageSelected.notice()),
        };

        match self.service.compare_image(&image) {
            Ok(response) => {
                let results = ResultsView::from_matches(self.service.base_url(), response.matches());
                self.state = ViewState::ShowingResults {
                    image,
                    results: results.clone(),
                };
                Ok(results)
            }
            Err(e) => {
                error!(error = %e, "similarity request failed");
                self.state = ViewState::Previewing(image);
                Err(e.notice())
            }
        }
    }
}

impl<S> Controller<S>
where
    S: SimilarityService + Clone + Send + 'static,
{
    /// Start a URL fetch on a worker thread. Feed the result back through
    /// `complete_acquisition` with the pending ticket.
    pub fn spawn_url_acquisition(&mut self, url: &str) -> PendingAcquisition {
        let ticket = self.begin_acquisition();
        let (tx, rx) = mpsc::channel();
        let service = self.service.clone();
        let worker_url = url.to_string();
        thread::spawn(move || {
            // receiver may be gone if the UI gave up; nothing to do then
            let _ = tx.send(service.fetch_image(&worker_url));
        });
        PendingAcquisition {
            ticket,
            url: url.to_string(),
            rx,
        }
    }
}
