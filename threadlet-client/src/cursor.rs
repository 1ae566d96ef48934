use crate::api::{CommentId, ListComments, Order, TargetId, TargetType};

/// Identifies one page request. `generation` tells apart the successive
/// cursors opened for the same level, `seq` the requests of one cursor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PageTicket {
    pub generation: u64,
    pub seq: u64,
}

/// One page fetch handed out by a `PageCursor`. It must be given back to
/// the same cursor, through `complete` or `fail`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub ticket: PageTicket,
    pub query: ListComments,
}

impl PageRequest {
    pub fn parent(&self) -> Option<CommentId> {
        self.query.parent_comment_id
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }
}

/// What a cursor made of a page response
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageOutcome {
    /// The response is the latest one requested and must be merged
    Applied { page: u32, exhausted: bool },

    /// The response was superseded (eg. by an order reset) and must be dropped
    Stale,
}

/// Pagination progress of one level of one comment thread, for one order.
///
/// `page` is the highest page successfully fetched (0 before the first
/// fetch). Once a page comes back shorter than `page_size`, the cursor is
/// exhausted and stays so until `reset`.
#[derive(Clone, Debug)]
pub struct PageCursor {
    target_type: TargetType,
    target_id: TargetId,
    parent: Option<CommentId>,
    depth: u32,
    order: Order,
    page_size: u32,

    page: u32,
    exhausted: bool,

    generation: u64,
    next_seq: u64,
    in_flight: Option<PageTicket>,
}

impl PageCursor {
    /// `depth` is the depth of the comments this cursor lists, ie. 0 for the
    /// root level and the parent's depth + 1 otherwise.
    ///
    /// A cursor replacing an earlier one for the same level must get a
    /// different `generation`, so that answers to the earlier cursor's
    /// requests are reported as stale.
    pub fn new(
        target_type: TargetType,
        target_id: TargetId,
        parent: Option<CommentId>,
        depth: u32,
        order: Order,
        page_size: u32,
        generation: u64,
    ) -> PageCursor {
        PageCursor {
            target_type,
            target_id,
            parent,
            depth,
            order,
            page_size: page_size.max(1),
            page: 0,
            exhausted: false,
            generation,
            next_seq: 0,
            in_flight: None,
        }
    }

    pub fn parent(&self) -> Option<CommentId> {
        self.parent
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether "load more" makes sense right now
    pub fn can_load_more(&self) -> bool {
        !self.exhausted && self.in_flight.is_none()
    }

    /// Hands out the request for the next page. Returns None once exhausted,
    /// and while a previous request is still in flight, so that no page is
    /// requested twice.
    pub fn next_request(&mut self) -> Option<PageRequest> {
        if !self.can_load_more() {
            return None;
        }
        let ticket = PageTicket {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.in_flight = Some(ticket);
        Some(PageRequest {
            ticket,
            query: ListComments {
                target_type: self.target_type,
                target_id: self.target_id,
                depth: self.depth,
                parent_comment_id: self.parent,
                order_by: self.order.by,
                desc: self.order.desc,
                page: self.page + 1,
                size: self.page_size,
            },
        })
    }

    fn is_current(&self, req: &PageRequest) -> bool {
        self.in_flight == Some(req.ticket)
    }

    /// Records a successful fetch of `fetched` records for `req`
    pub fn complete(&mut self, req: &PageRequest, fetched: usize) -> PageOutcome {
        if !self.is_current(req) {
            tracing::warn!(parent=?self.parent, page = req.page(), "discarding stale comment page");
            return PageOutcome::Stale;
        }
        self.in_flight = None;
        self.page = req.page();
        if fetched < self.page_size as usize {
            self.exhausted = true;
        }
        PageOutcome::Applied {
            page: self.page,
            exhausted: self.exhausted,
        }
    }

    /// Records a failed fetch: the page does not advance and the same page
    /// will be requested again by the next `next_request`
    pub fn fail(&mut self, req: &PageRequest) {
        if self.is_current(req) {
            self.in_flight = None;
        }
    }

    /// Restarts from page 1 with `order`. Responses to requests issued
    /// before the reset will be reported as stale.
    pub fn reset(&mut self, order: Order) {
        self.order = order;
        self.page = 0;
        self.exhausted = false;
        self.in_flight = None;
    }
}
