//! Helpers for infrastructure definitions built on asynchronous values.
//!
//! * [template] renders Handlebars templates once every [Output] they refer to has resolved.
//! * [Policy] and [Statement] build AWS IAM policy documents whose principals, actions, resources and condition
//!   values may themselves be outputs, and render them to JSON.
#![warn(clippy::all)]

#[macro_use]
pub(crate) mod serutil;

pub(crate) mod condition;
pub(crate) mod effect;
pub(crate) mod error;
pub(crate) mod output;
pub(crate) mod policy;
pub(crate) mod principal;
pub(crate) mod statement;
pub mod template;

pub use {
    condition::{Condition, ConditionMap},
    effect::Effect,
    error::DeferError,
    output::Output,
    policy::{Policy, PolicyBuilder, PolicyVersion},
    principal::Principal,
    serutil::{StringInput, Strings},
    statement::{Statement, StatementBuilder},
    template::{RenderOptions, RenderOptionsBuilder, RenderOptionsBuilderError, Template, TemplateVar},
};
