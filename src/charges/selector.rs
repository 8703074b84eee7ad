use crate::errors::{LendingError, Result};
use crate::schedule::ScheduledAction;

use super::{ChargeDefinition, ChargeRange, ScheduledCharge, SegmentSet};

/// attach the applicable charge definitions to every scheduled action and
/// order the result deterministically
///
/// a definition fires on an action at its accrue action when it accrues,
/// otherwise at its charge action. tiered charges resolve their range
/// against the product's named segment sets; charges without segment
/// fields carry no range.
pub fn scheduled_charges(
    scheduled_actions: &[ScheduledAction],
    charge_definitions: &[ChargeDefinition],
    segment_sets: &[SegmentSet],
) -> Result<Vec<ScheduledCharge>> {
    let mut charges = Vec::new();
    for scheduled_action in scheduled_actions {
        for definition in charge_definitions {
            if !definition.fires_on(scheduled_action.action) {
                continue;
            }
            charges.push(ScheduledCharge {
                scheduled_action: *scheduled_action,
                charge_definition: definition.clone(),
                charge_range: resolve_range(definition, segment_sets)?,
            });
        }
    }
    charges.sort_by_key(|charge| charge.sort_key());
    Ok(charges)
}

/// resolve the balance tier of a segmented charge
///
/// returns None for charges without segment fields; naming a segment set
/// the product does not carry, or a segment missing from the set, is a
/// configuration error.
fn resolve_range(
    definition: &ChargeDefinition,
    segment_sets: &[SegmentSet],
) -> Result<Option<ChargeRange>> {
    let set_identifier = match &definition.for_segment_set {
        Some(identifier) => identifier,
        None => return Ok(None),
    };
    let (from_segment, to_segment) = match (&definition.from_segment, &definition.to_segment) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(LendingError::NoSegmentConfigured {
                charge_identifier: definition.identifier.clone(),
            })
        }
    };
    let set = segment_sets
        .iter()
        .find(|s| &s.identifier == set_identifier)
        .ok_or_else(|| LendingError::SegmentNotFound {
            segment_set_identifier: set_identifier.clone(),
            segment_identifier: from_segment.clone(),
        })?;
    set.range_between(from_segment, to_segment).map(Some)
}
