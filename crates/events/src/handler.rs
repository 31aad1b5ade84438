/// Decide and evolve in one step: run `handle`, then `apply` every produced
/// event to the same instance.
///
/// Used wherever an aggregate is driven in-process (engine orchestration,
/// tests) rather than through a store round-trip.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: batchline_core::Aggregate,
{
    let events = aggregate.handle(command)?;
    for ev in &events {
        aggregate.apply(ev);
    }
    Ok(events)
}
