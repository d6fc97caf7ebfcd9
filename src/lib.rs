//! `informe` is a client for a vehicle-workshop report service. Given the opaque
//! token of a shared report it fetches the report payload over HTTPS, normalizes
//! the loosely-typed "revision" field into ordered display sections and renders
//! everything into a paginated PDF document named after the vehicle VIN.
//!
//! The crate is a library; the `informe` binary is a thin command line interface
//! over it. The three core pieces compose linearly: the loader in `api` fetches,
//! `revision::normalize` transforms, and `layout::render_report` consumes the
//! normalized structure together with the raw report fields to produce a
//! `pdf::PdfDocument` ready to be saved.

/// The report loader: a blocking HTTP client for the report service.
///
/// The loader performs exactly one request per invocation and classifies the
/// outcome into the `error::ReportError` taxonomy; it never retries, never
/// caches and distinguishes nothing beyond "loaded" and "not available". It
/// also carries the login call whose bearer token feeds the optional
/// authorization header of gated deployments.
pub mod api;

/// This module contains the `ContextError` type which is the general error type
/// used throughout this library, together with the `ReportError` taxonomy of
/// the loader.
///
/// `ContextError` carries a context message and, if an error was propagated
/// from below, its stringified source, so the end user always gets an
/// explanation without the library committing to a zoo of error codes.
pub mod error;

/// The paginated report renderer.
///
/// The renderer walks a vertical cursor down an A4 page: a fixed header band
/// and a vehicle card first, then the revision sections and the detected
/// errors as flowing lines. Before every line it checks the cursor against
/// the bottom threshold and starts a fresh page when the line would land past
/// it, so content never overflows the drawable area.
pub mod layout;

/// The module where the `PdfDocument` interface for building PDF documents is
/// presented.
///
/// This is a deliberately small surface over `lopdf`: pages accumulate content
/// stream operations for text and simple vector shapes, and `write_all`
/// assembles the document information, catalog, font and page dictionaries
/// the PDF specification requires. Text uses the built-in standard fonts with
/// the WinAnsi encoding, so the produced files embed no font programs.
pub mod pdf;

/// The wire schema of the report service: the `VehicleReport` payload and the
/// vehicle record inside it, validated at the boundary so that the rest of the
/// crate consumes one well-typed shape.
pub mod report;

/// The revision normalizer.
///
/// The service stores the inspection "revision" in heterogeneous shapes (a
/// JSON object, a single-quoted stringified object, or nothing at all). This
/// module resolves that ambiguity in exactly one place, returning the ordered
/// list of sections the renderer displays.
pub mod revision;

/// The session store: a file-backed record of the bearer token obtained at
/// login, read by the loader when a deployment gates the report endpoint.
pub mod session;

/// Construction of the public share link for a report, in the exact format the
/// service mails out.
pub mod share;
