//! Season pagination: offset cursor driven by the declared `total`

use std::time::Duration;

use lapline_core::{Pause, ThreadPause, Transport};

use crate::api::{FetchError, FetchedPage, PageFetcher};
use crate::config::FetchConfig;

/// Drives a [`PageFetcher`] across the pages of one season at a time.
pub struct SeasonPaginator<T, P = ThreadPause> {
    fetcher: PageFetcher<T, P>,
    fallback_offset_cap: u64,
    page_delay: Duration,
}

impl<T: Transport, P: Pause> SeasonPaginator<T, P> {
    pub fn new(fetcher: PageFetcher<T, P>, config: &FetchConfig) -> Self {
        Self {
            fetcher,
            fallback_offset_cap: config.fallback_offset_cap,
            page_delay: config.page_delay,
        }
    }

    /// Lazily fetch every page of `season`, starting at offset 0.
    pub fn paginate(
        &self,
        endpoint: &str,
        season: i32,
        page_size: u64,
    ) -> Result<SeasonPages<'_, T, P>, FetchError> {
        if page_size == 0 {
            return Err(FetchError::InvalidRequest(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(SeasonPages {
            paginator: self,
            endpoint: endpoint.to_string(),
            season,
            page_size,
            state: Cursor::Requesting { offset: 0 },
            degraded: false,
            last_declared: None,
            left_unfetched: None,
        })
    }

    pub fn fetcher(&self) -> &PageFetcher<T, P> {
        &self.fetcher
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Requesting { offset: u64 },
    Done,
}

/// Pages of one season. Ends after the last page or after the first error.
pub struct SeasonPages<'a, T, P> {
    paginator: &'a SeasonPaginator<T, P>,
    endpoint: String,
    season: i32,
    page_size: u64,
    state: Cursor,
    degraded: bool,
    /// Most recent `total` any page of this season declared
    last_declared: Option<u64>,
    /// Declared records past the stop offset when the season ended on the cap
    left_unfetched: Option<u64>,
}

impl<T: Transport, P: Pause> SeasonPages<'_, T, P> {
    /// Offset the next request will use, if any
    pub fn next_offset(&self) -> Option<u64> {
        match self.state {
            Cursor::Requesting { offset } => Some(offset),
            Cursor::Done => None,
        }
    }

    /// Declared records never requested because the season stopped on the cap
    pub fn left_unfetched(&self) -> Option<u64> {
        self.left_unfetched
    }

    /// Where the season ends according to `page`
    fn end_offset(&mut self, page: &FetchedPage) -> u64 {
        match page.total {
            Some(total) => {
                self.last_declared = Some(total);
                total
            }
            None => {
                if !self.degraded {
                    self.degraded = true;
                    log::warn!(
                        "{} {}: no usable 'total' in response, stopping at offset {}",
                        self.endpoint,
                        self.season,
                        self.paginator.fallback_offset_cap
                    );
                }
                self.paginator.fallback_offset_cap
            }
        }
    }
}

impl<T: Transport, P: Pause> Iterator for SeasonPages<'_, T, P> {
    type Item = Result<FetchedPage, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        let Cursor::Requesting { offset } = self.state else {
            return None;
        };

        // Only reachable past offset 0 after a successful page
        if offset > 0 {
            self.paginator
                .fetcher
                .pause()
                .pause(self.paginator.page_delay);
        }

        let page = match self
            .paginator
            .fetcher
            .fetch_page(&self.endpoint, self.season, offset, self.page_size)
        {
            Ok(page) => page,
            Err(e) => {
                self.state = Cursor::Done;
                return Some(Err(e));
            }
        };

        let end = self.end_offset(&page);
        let next = offset.saturating_add(self.page_size);
        self.state = if next >= end {
            Cursor::Done
        } else {
            Cursor::Requesting { offset: next }
        };

        if self.state == Cursor::Done && page.total.is_none() {
            let unfetched = self.last_declared.map_or(0, |t| t.saturating_sub(next));
            if unfetched > 0 {
                self.left_unfetched = Some(unfetched);
                log::warn!(
                    "{} {}: stopped at offset {next} on the fallback cap, {unfetched} of {} declared records left unfetched",
                    self.endpoint,
                    self.season,
                    self.last_declared.unwrap_or_default()
                );
            }
        }

        // A declared total at or below this offset means the page is empty
        if page.total.is_some_and(|total| offset >= total) {
            log::info!(
                "{} {}: nothing to fetch (total={})",
                self.endpoint,
                self.season,
                page.total.unwrap_or_default()
            );
            return None;
        }

        Some(Ok(page))
    }
}
