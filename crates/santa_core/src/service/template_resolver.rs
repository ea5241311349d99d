//! Template configuration cascade.
//!
//! Each overridable field takes the first value present in
//! participant -> exchange -> global default order. The template group skips
//! the participant level.

use crate::model::template::{EffectiveTemplateConfig, TemplateOverride};

/// Returns the first present value, or `fallback` when every level defers.
pub fn first_present<'a, T, I>(levels: I, fallback: &'a T) -> &'a T
where
    T: ?Sized + 'a,
    I: IntoIterator<Item = Option<&'a T>>,
{
    levels.into_iter().flatten().next().unwrap_or(fallback)
}

/// Resolves the effective rendering configuration for one notification.
///
/// `participant` is the override record of the assignment's gift receiver.
pub fn resolve(
    defaults: &EffectiveTemplateConfig,
    exchange: &TemplateOverride,
    participant: &TemplateOverride,
) -> EffectiveTemplateConfig {
    let sender_name = first_present(
        [
            participant.sender_name.as_deref(),
            exchange.sender_name.as_deref(),
        ],
        defaults.sender_name.as_str(),
    );
    let email_format = first_present(
        [participant.email_format.as_ref(), exchange.email_format.as_ref()],
        &defaults.email_format,
    );
    let template_name = first_present(
        [
            participant.template_name.as_deref(),
            exchange.template_name.as_deref(),
        ],
        defaults.template_name.as_str(),
    );
    let template_group = first_present(
        [exchange.template_group.as_deref()],
        defaults.template_group.as_str(),
    );

    EffectiveTemplateConfig {
        sender_name: sender_name.to_string(),
        email_format: *email_format,
        template_group: template_group.to_string(),
        template_name: template_name.to_string(),
    }
}
