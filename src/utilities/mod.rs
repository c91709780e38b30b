/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
mod deadline;
mod flag;

pub(crate) use deadline::{exhausted, Deadline};
pub(crate) use flag::Flag;
