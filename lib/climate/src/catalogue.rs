use std::{cmp::Ordering, collections::HashMap};

use chrono::NaiveDate;
use support::time::{DateTime, Duration};

use crate::{Error, Result, State, Transition};

/// Validated graph of climate states and the transitions between them.
///
/// Topology is fixed after construction. Query position lives in a separate
/// [`Cursor`], so one catalogue can serve any number of independent walks.
#[derive(Debug, Clone)]
pub struct Catalogue {
    reference_date: NaiveDate,
    origin: DateTime,
    states: Vec<State>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    /// Common period of all recurring transitions, if they share one.
    pub(crate) period: Option<Duration>,
    pub(crate) one_offs: Option<(DateTime, DateTime)>,
}

#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub transition: Transition,
    pub from: usize,
    pub to: usize,
}

/// A concrete firing of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Firing {
    pub edge: usize,
    pub trigger: DateTime,
}

/// Position of a walk through the catalogue: the state active at `time` and
/// the firing that entered it, if there was one.
///
/// Exits of the current state are looked up after `since`, the entry trigger
/// or, for a state without a known entry, the instant the walk reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub(crate) current: usize,
    pub(crate) entered: Option<Firing>,
    pub(crate) since: DateTime,
    pub(crate) time: DateTime,
}

impl Catalogue {
    pub fn new(states: Vec<State>, transitions: Vec<Transition>, reference_date: NaiveDate) -> Result<Self> {
        if states.is_empty() {
            return Err(Error::NoStates);
        }

        for transition in transitions.iter() {
            transition.validate()?;
        }

        let mut index = HashMap::new();
        for (i, state) in states.iter().enumerate() {
            if let Some(unit) = state.nan_unit() {
                return Err(Error::InvalidState {
                    name: state.name.clone(),
                    reason: format!("{unit} is NaN"),
                });
            }

            if index.insert(state.name.clone(), i).is_some() {
                return Err(Error::DuplicateState {
                    name: state.name.clone(),
                });
            }
        }

        let mut edges = Vec::with_capacity(transitions.len());
        let mut outgoing = vec![Vec::new(); states.len()];
        let mut incoming = vec![Vec::new(); states.len()];

        for transition in transitions {
            let resolve = |name: &str| {
                index.get(name).copied().ok_or_else(|| Error::UndefinedState {
                    name: name.to_owned(),
                    transition: transition.to_string(),
                })
            };
            let (from, to) = (resolve(&transition.from)?, resolve(&transition.to)?);

            outgoing[from].push(edges.len());
            incoming[to].push(edges.len());
            edges.push(Edge { transition, from, to });
        }

        let origin = DateTime::midnight(reference_date);

        let mut periods = edges
            .iter()
            .filter(|edge| !edge.transition.is_one_off())
            .map(|edge| edge.transition.period());
        let first_period = periods.next();
        let period = first_period.filter(|first| periods.all(|period| period == *first));

        let one_off_triggers = edges
            .iter()
            .filter(|edge| edge.transition.is_one_off())
            .filter_map(|edge| edge.transition.one_off_trigger(origin));
        let one_offs = one_off_triggers.clone().min().zip(one_off_triggers.max());

        let mut catalogue = Self {
            reference_date,
            origin,
            states,
            index,
            edges,
            outgoing,
            incoming,
            period,
            one_offs,
        };

        catalogue.detect_shadowing()?;
        catalogue.backfill_boundaries();

        tracing::debug!(
            "Built climate catalogue with {} states and {} transitions, reference date {}",
            catalogue.states.len(),
            catalogue.edges.len(),
            catalogue.reference_date
        );

        Ok(catalogue)
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.index.get(name).map(|&i| &self.states[i])
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.edges.iter().map(|edge| &edge.transition)
    }

    /// The first declared state, entered by its latest incoming firing at or
    /// before midnight of the reference date. The walk starts at that firing,
    /// so exits between it and midnight are not skipped.
    pub fn initial_cursor(&self) -> Cursor {
        let entered = self.latest_entry(0, self.origin);
        let since = entered.map_or(self.origin, |firing| firing.trigger);

        Cursor {
            current: 0,
            entered,
            since,
            time: since,
        }
    }

    pub fn cursor_state(&self, cursor: &Cursor) -> &State {
        &self.states[cursor.current]
    }

    /// State the cursor came from, when the walk knows it.
    pub fn cursor_previous(&self, cursor: &Cursor) -> Option<&State> {
        cursor
            .entered
            .map(|firing| &self.states[self.edges[firing.edge].from])
    }

    pub(crate) fn edge(&self, firing: Firing) -> &Edge {
        &self.edges[firing.edge]
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Latest firing at or before `until` that leads into `state`.
    pub(crate) fn latest_entry(&self, state: usize, until: DateTime) -> Option<Firing> {
        self.incoming[state]
            .iter()
            .filter_map(|&edge| {
                self.edges[edge]
                    .transition
                    .last_trigger_until(self.origin, until)
                    .map(|trigger| Firing { edge, trigger })
            })
            .max_by(|a, b| a.trigger.cmp(&b.trigger).then_with(|| self.precedence(b, a)))
    }

    /// Earliest firing strictly after `after` that leaves `state`.
    pub(crate) fn next_exit(&self, state: usize, after: DateTime) -> Option<Firing> {
        self.outgoing[state]
            .iter()
            .filter_map(|&edge| {
                self.edges[edge]
                    .transition
                    .next_trigger_after(self.origin, after)
                    .map(|trigger| Firing { edge, trigger })
            })
            .min_by(|a, b| a.trigger.cmp(&b.trigger).then_with(|| self.precedence(a, b)))
    }

    // Orders firings of the same instant: one-off before recurring, then declaration order.
    fn precedence(&self, a: &Firing, b: &Firing) -> Ordering {
        let one_off = |firing: &Firing| self.edges[firing.edge].transition.is_one_off();

        one_off(b).cmp(&one_off(a)).then(a.edge.cmp(&b.edge))
    }

    fn detect_shadowing(&self) -> Result<()> {
        for edges in self.outgoing.iter() {
            for (i, &first) in edges.iter().enumerate() {
                for &second in &edges[i + 1..] {
                    let (a, b) = (&self.edges[first].transition, &self.edges[second].transition);

                    let same_day = a.is_one_off() && a.day == b.day;
                    let same_recurrence = !a.is_one_off()
                        && !b.is_one_off()
                        && a.start == b.start
                        && a.start_time_delta == b.start_time_delta;

                    if same_day || same_recurrence {
                        return Err(Error::Shadowed {
                            shadowed: b.to_string(),
                            by: a.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    // Undefined units adopt the value of the first neighbour, outgoing side first.
    // Neighbours are read as declared so the result is independent of state order.
    fn backfill_boundaries(&mut self) {
        let declared = self.states.clone();

        for (i, state) in self.states.iter_mut().enumerate() {
            if let Some(&edge) = self.outgoing[i].first() {
                *state = state.blend(&declared[self.edges[edge].to], 0.0);
            }

            if let Some(&edge) = self.incoming[i].first() {
                *state = declared[self.edges[edge].from].blend(state, 1.0);
            }
        }
    }
}

impl Cursor {
    pub fn time(&self) -> DateTime {
        self.time
    }
}
