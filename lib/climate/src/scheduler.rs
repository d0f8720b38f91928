use support::time::{DateTime, Duration};

use crate::{
    Catalogue, Cursor, Interpolation, State,
    catalogue::Firing,
};

/// Setpoint for a query instant together with what comes after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledClimate {
    pub current: Interpolation,
    /// End of the validity window of `current`, `None` when it never ends.
    pub next_change: Option<DateTime>,
    pub next: Option<Interpolation>,
}

impl ScheduledClimate {
    pub fn state(&self, at: DateTime) -> State {
        self.current.state(at)
    }
}

pub trait Scheduler {
    fn current_interpolation(&mut self, at: DateTime) -> ScheduledClimate;
}

/// Walks the catalogue from query to query. Consecutive queries close to each
/// other only look at the transitions between them.
#[derive(Debug, Clone)]
pub struct SequentialScheduler {
    catalogue: Catalogue,
    cursor: Cursor,
}

/// Answers every query from scratch, starting at the reference date.
#[derive(Debug, Clone)]
pub struct StatelessScheduler {
    catalogue: Catalogue,
}

impl SequentialScheduler {
    pub fn new(catalogue: Catalogue) -> Self {
        let cursor = catalogue.initial_cursor();
        Self { catalogue, cursor }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn current_state(&self) -> &State {
        self.catalogue.cursor_state(&self.cursor)
    }

    pub fn previous_state(&self) -> Option<&State> {
        self.catalogue.cursor_previous(&self.cursor)
    }
}

impl Scheduler for SequentialScheduler {
    fn current_interpolation(&mut self, at: DateTime) -> ScheduledClimate {
        self.catalogue.advance(&mut self.cursor, at)
    }
}

impl StatelessScheduler {
    pub fn new(catalogue: Catalogue) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }
}

impl Scheduler for StatelessScheduler {
    fn current_interpolation(&mut self, at: DateTime) -> ScheduledClimate {
        self.catalogue.schedule_at(at)
    }
}

impl Catalogue {
    /// Schedule at `at`, walked from the reference date without retained state.
    pub fn schedule_at(&self, at: DateTime) -> ScheduledClimate {
        let mut cursor = self.initial_cursor();
        self.advance(&mut cursor, at)
    }

    /// Moves `cursor` to the state active at `at` and brackets `at` with the
    /// surrounding interpolations.
    pub fn advance(&self, cursor: &mut Cursor, at: DateTime) -> ScheduledClimate {
        if let Some(skipped) = self.skip_cycles(cursor, at) {
            *cursor = skipped;
        }

        while let Some(step) = self.step_towards(cursor, at) {
            *cursor = step;
        }

        cursor.time = at;
        self.bracket(cursor, at)
    }

    // One firing closer to `at`, or `None` once the cursor holds the state active at `at`.
    fn step_towards(&self, cursor: &Cursor, at: DateTime) -> Option<Cursor> {
        if let Some(entered) = cursor.entered.filter(|entered| at < entered.trigger) {
            let origin = self.edge(entered).from;
            let time = entered.trigger.checked_sub(Duration::nanos(1)).unwrap_or(at);
            let entry = self.latest_entry(origin, time);

            tracing::trace!(
                "Stepping back over {} at {}",
                self.edge(entered).transition,
                entered.trigger
            );

            return Some(Cursor {
                current: origin,
                entered: entry,
                since: entry.map_or(time, |firing| firing.trigger),
                time,
            });
        }

        let exit = self
            .next_exit(cursor.current, cursor.since)
            .filter(|exit| at >= exit.trigger)?;

        tracing::trace!("Following {} at {}", self.edge(exit).transition, exit.trigger);

        Some(Cursor {
            current: self.edge(exit).to,
            entered: Some(exit),
            since: exit.trigger,
            time: exit.trigger,
        })
    }

    /// Skips whole cycles of the walk when `at` is far away from the cursor.
    ///
    /// With all recurring transitions sharing one period and no one-off firing
    /// between cursor and `at`, the walk repeats as soon as it re-enters a
    /// state over the same transition. Everything in between is shifted by a
    /// multiple of that cycle.
    fn skip_cycles(&self, cursor: &Cursor, at: DateTime) -> Option<Cursor> {
        let period = self.period?.as_nanos();
        let forward = at >= cursor.since;
        let distance = if forward { at - cursor.since } else { cursor.since - at };

        if distance.as_nanos() < 2 * (self.edge_count() as i128 + 2) * period {
            return None;
        }

        let clear = match self.one_offs {
            None => true,
            Some((_, last)) if forward => last <= cursor.since,
            Some((first, _)) => first > cursor.since,
        };
        if !clear {
            return None;
        }

        let same_position = |seen: &Cursor, step: &Cursor| {
            step.entered.is_some()
                && seen.current == step.current
                && seen.entered.map(|firing| firing.edge) == step.entered.map(|firing| firing.edge)
        };

        let mut visited = vec![cursor.clone()];
        while visited.len() <= self.edge_count() + 1 {
            let step = self.step_towards(visited.last()?, at)?;

            if let Some(repeated) = visited.iter().find(|seen| same_position(*seen, &step)) {
                let cycle = (step.since - repeated.since).abs().as_nanos();
                let remaining = (at - step.since).abs().as_nanos();
                if cycle == 0 || remaining / cycle < 2 {
                    return Some(step);
                }

                let cycles = remaining / cycle - 1;

                let shift = Duration::try_nanos(if forward { cycles * cycle } else { -cycles * cycle })?;
                let shifted = step.entered.and_then(|firing| {
                    Some(Firing {
                        edge: firing.edge,
                        trigger: firing.trigger.checked_add(shift)?,
                    })
                });

                tracing::trace!("Skipping {} cycles of the walk, {} in total", cycles, shift);

                return Some(Cursor {
                    current: step.current,
                    entered: shifted,
                    since: step.since.checked_add(shift)?,
                    time: step.time.checked_add(shift)?,
                });
            }

            visited.push(step);
        }

        None
    }

    fn bracket(&self, cursor: &Cursor, at: DateTime) -> ScheduledClimate {
        let current = self.cursor_state(cursor).clone();
        let exit = self.next_exit(cursor.current, at.max(cursor.since));
        let upcoming = exit.map(|exit| self.blend(exit));

        // `None` for a blend ending beyond the representable range
        let blend_end = |firing: Firing| firing.trigger.checked_add(self.edge(firing).transition.duration);

        match cursor.entered {
            Some(entered) if blend_end(entered).is_none_or(|end| at < end) => {
                let end = blend_end(entered);

                match exit {
                    Some(exit) if end.is_none_or(|end| exit.trigger < end) => ScheduledClimate {
                        current: self.blend(entered),
                        next_change: Some(exit.trigger),
                        next: upcoming,
                    },
                    _ => ScheduledClimate {
                        current: self.blend(entered),
                        next_change: end,
                        next: end.map(|_| Interpolation::Static(current)),
                    },
                }
            }
            _ => ScheduledClimate {
                current: Interpolation::Static(current),
                next_change: exit.map(|exit| exit.trigger),
                next: upcoming,
            },
        }
    }

    fn blend(&self, firing: Firing) -> Interpolation {
        let edge = self.edge(firing);

        Interpolation::Blend {
            from: self.states()[edge.from].clone(),
            to: self.states()[edge.to].clone(),
            start: firing.trigger,
            duration: edge.transition.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Transition, unit::Temperature};
    use chrono::NaiveDate;
    use support::t;

    fn at(iso: &str) -> DateTime {
        DateTime::from_iso(iso).unwrap()
    }

    fn reference_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn midnight_flip() -> Catalogue {
        Catalogue::new(
            vec![
                State::new("a").with_temperature(20.0),
                State::new("b").with_temperature(30.0),
            ],
            vec![
                Transition::recurring("a", "b", t!(23:59), t!(30 minutes)),
                Transition::recurring("b", "a", t!(5:45), t!(30 minutes)),
            ],
            reference_date(),
        )
        .unwrap()
    }

    fn storm_week() -> Catalogue {
        Catalogue::new(
            vec![
                State::new("night").with_temperature(18.0).with_visible_light(0.0),
                State::new("day").with_temperature(26.0).with_visible_light(100.0),
                State::new("storm").with_temperature(22.0).with_wind(80.0),
            ],
            vec![
                Transition::recurring("night", "day", t!(6:00), t!(30 minutes)),
                Transition::recurring("day", "night", t!(20:00), t!(30 minutes)),
                Transition::one_off("day", "storm", 3, t!(14:00), t!(10 minutes)),
                Transition::one_off("storm", "day", 3, t!(15:00), t!(20 minutes)),
            ],
            reference_date(),
        )
        .unwrap()
    }

    fn summary(climate: &ScheduledClimate) -> (String, Option<DateTime>) {
        (climate.current.describe(), climate.next_change)
    }

    #[test]
    fn test_minute_walk_over_three_days() {
        let catalogue = midnight_flip();
        let mut sequential = SequentialScheduler::new(catalogue.clone());
        let mut stateless = StatelessScheduler::new(catalogue);

        let mut segments: Vec<(String, Option<DateTime>)> = vec![];
        let mut now = at("2024-01-01T00:00:00Z");
        let end = at("2024-01-04T00:00:00Z");

        while now < end {
            let climate = sequential.current_interpolation(now);
            assert_eq!(climate, stateless.current_interpolation(now), "diverged at {now}");

            let entry = summary(&climate);
            if segments.last() != Some(&entry) {
                segments.push(entry);
            }

            now += t!(1 minutes);
        }

        let blend = |from: &str, to: &str, start: &str| {
            format!("Blend[{from} -> {to} from {start} for PT30M]")
        };

        assert_eq!(
            segments,
            vec![
                (blend("a", "b", "2023-12-31 23:59:00"), Some(at("2024-01-01T00:29:00Z"))),
                ("Static[b]".to_owned(), Some(at("2024-01-01T05:45:00Z"))),
                (blend("b", "a", "2024-01-01 05:45:00"), Some(at("2024-01-01T06:15:00Z"))),
                ("Static[a]".to_owned(), Some(at("2024-01-01T23:59:00Z"))),
                (blend("a", "b", "2024-01-01 23:59:00"), Some(at("2024-01-02T00:29:00Z"))),
                ("Static[b]".to_owned(), Some(at("2024-01-02T05:45:00Z"))),
                (blend("b", "a", "2024-01-02 05:45:00"), Some(at("2024-01-02T06:15:00Z"))),
                ("Static[a]".to_owned(), Some(at("2024-01-02T23:59:00Z"))),
                (blend("a", "b", "2024-01-02 23:59:00"), Some(at("2024-01-03T00:29:00Z"))),
                ("Static[b]".to_owned(), Some(at("2024-01-03T05:45:00Z"))),
                (blend("b", "a", "2024-01-03 05:45:00"), Some(at("2024-01-03T06:15:00Z"))),
                ("Static[a]".to_owned(), Some(at("2024-01-03T23:59:00Z"))),
                (blend("a", "b", "2024-01-03 23:59:00"), Some(at("2024-01-04T00:29:00Z"))),
            ]
        );
    }

    #[test]
    fn test_schedulers_agree_across_reference_midnight() {
        let catalogue = midnight_flip();
        let mut sequential = SequentialScheduler::new(catalogue.clone());
        let mut now = at("2023-12-31T22:00:00Z");

        while now < at("2024-01-01T02:00:00Z") {
            assert_eq!(
                sequential.current_interpolation(now),
                catalogue.schedule_at(now),
                "diverged at {now}"
            );
            now += t!(30 seconds);
        }

        let before = catalogue.schedule_at(at("2023-12-31T23:58:00Z"));
        assert_eq!(before.current.describe(), "Static[a]");
        assert_eq!(before.next_change, Some(at("2023-12-31T23:59:00Z")));

        let fired = catalogue.schedule_at(at("2023-12-31T23:59:30Z"));
        assert_eq!(fired.current.describe(), "Blend[a -> b from 2023-12-31 23:59:00 for PT30M]");
        assert_eq!(fired.next_change, Some(at("2024-01-01T00:29:00Z")));
    }

    #[test]
    fn test_blend_midpoint_across_midnight() {
        let climate = midnight_flip().schedule_at(at("2024-01-02T00:14:00Z"));

        assert_eq!(
            climate.state(at("2024-01-02T00:14:00Z")).temperature,
            Temperature(25.0)
        );
        assert_eq!(climate.next, Some(Interpolation::Static(State::new("b").with_temperature(30.0))));
    }

    #[test]
    fn test_next_change_brackets_query() {
        let catalogue = storm_week();
        let mut scheduler = SequentialScheduler::new(catalogue.clone());
        let mut now = at("2023-12-29T00:00:00Z");

        while now < at("2024-01-06T00:00:00Z") {
            let climate = scheduler.current_interpolation(now);
            assert_eq!(climate, catalogue.schedule_at(now), "diverged at {now}");

            let next_change = climate.next_change.unwrap();
            assert!(next_change > now, "{next_change} not after {now}");

            if let Interpolation::Blend { start, .. } = climate.current {
                assert!(start <= now);
                assert!(next_change <= climate.current.end_time().unwrap());
            }

            match climate.next.as_ref().unwrap() {
                Interpolation::Blend { start, .. } => {
                    assert_eq!(*start, next_change, "next blend does not start at {next_change}")
                }
                Interpolation::Static(_) => {
                    assert_eq!(climate.current.end_time(), Some(next_change), "gap before {next_change}")
                }
            }

            now += t!(7 minutes);
        }
    }

    #[test]
    fn test_one_off_storm() {
        let catalogue = storm_week();

        let before = catalogue.schedule_at(at("2024-01-03T13:00:00Z"));
        assert_eq!(before.current.describe(), "Static[day]");
        assert_eq!(before.next_change, Some(at("2024-01-03T14:00:00Z")));
        assert_eq!(before.next.unwrap().end().map(|s| s.name.clone()), Some("storm".to_owned()));

        let storm = catalogue.schedule_at(at("2024-01-03T14:30:00Z"));
        assert_eq!(storm.current.describe(), "Static[storm]");
        assert_eq!(storm.next_change, Some(at("2024-01-03T15:00:00Z")));

        let recovery = catalogue.schedule_at(at("2024-01-03T15:10:00Z"));
        assert_eq!(
            recovery.current.describe(),
            "Blend[storm -> day from 2024-01-03 15:00:00 for PT20M]"
        );

        let evening = catalogue.schedule_at(at("2024-01-03T21:00:00Z"));
        assert_eq!(evening.current.describe(), "Static[night]");

        let next_day = catalogue.schedule_at(at("2024-01-04T14:30:00Z"));
        assert_eq!(next_day.current.describe(), "Static[day]");
        assert_eq!(next_day.next_change, Some(at("2024-01-04T20:00:00Z")));
    }

    #[test]
    fn test_one_off_wins_collision_with_recurring() {
        let catalogue = Catalogue::new(
            vec![
                State::new("night").with_temperature(18.0),
                State::new("day").with_temperature(26.0),
                State::new("eclipse").with_temperature(15.0),
            ],
            vec![
                Transition::recurring("night", "day", t!(6:00), t!(30 minutes)),
                Transition::recurring("day", "night", t!(20:00), t!(30 minutes)),
                Transition::one_off("night", "eclipse", 2, t!(6:00), t!(5 minutes)),
                Transition::one_off("eclipse", "day", 2, t!(9:00), t!(5 minutes)),
            ],
            reference_date(),
        )
        .unwrap();

        let climate = catalogue.schedule_at(at("2024-01-02T07:00:00Z"));

        assert_eq!(climate.current.describe(), "Static[eclipse]");
        assert_eq!(climate.next_change, Some(at("2024-01-02T09:00:00Z")));
    }

    #[test]
    fn test_queries_far_from_reference_date() {
        let mut scheduler = SequentialScheduler::new(storm_week());

        let past = scheduler.current_interpolation(at("1990-06-01T12:00:00Z"));
        assert_eq!(past.current.describe(), "Static[day]");
        assert_eq!(scheduler.current_state().name, "day");

        let future = scheduler.current_interpolation(at("2060-06-01T03:00:00Z"));
        assert_eq!(future.current.describe(), "Static[night]");
        assert_eq!(future.next_change, Some(at("2060-06-01T06:00:00Z")));
        assert_eq!(scheduler.previous_state().map(|s| s.name.as_str()), Some("day"));
    }

    #[test]
    fn test_queries_at_the_limits_of_time() {
        let catalogue = midnight_flip();
        let last_day = DateTime::midnight(NaiveDate::MAX);
        let first_day = DateTime::midnight(NaiveDate::MIN);

        let late = catalogue.schedule_at(last_day + t!(23 hours) + t!(59 minutes) + t!(30 seconds));
        assert_eq!(
            late.current,
            Interpolation::Blend {
                from: catalogue.states()[0].clone(),
                to: catalogue.states()[1].clone(),
                start: last_day + t!(23 hours) + t!(59 minutes),
                duration: t!(30 minutes),
            }
        );
        assert_eq!(late.current.end_time(), None);
        assert_eq!(late.next_change, None);
        assert_eq!(late.next, None);

        let early = catalogue.schedule_at(first_day + t!(1 hours));
        assert_eq!(early.current.describe(), "Static[b]");
        assert_eq!(early.next_change, Some(first_day + t!(5 hours) + t!(45 minutes)));
    }

    #[test]
    fn test_multi_day_cycle_far_ahead() {
        let catalogue = Catalogue::new(
            vec![State::new("a"), State::new("b"), State::new("c")],
            vec![
                Transition::recurring("a", "b", t!(6:00), t!(1 hours)),
                Transition::recurring("b", "c", t!(5:00), t!(1 hours)),
                Transition::recurring("c", "a", t!(7:00), t!(1 hours)),
            ],
            reference_date(),
        )
        .unwrap();

        let mut daily = SequentialScheduler::new(catalogue.clone());
        let mut now = at("2024-01-01T06:30:00Z");
        while now < at("2024-03-01T06:30:00Z") {
            daily.current_interpolation(now);
            now += t!(1 days);
        }

        let climate = catalogue.schedule_at(now);

        assert_eq!(climate, daily.current_interpolation(now));
        assert_eq!(climate.current.describe(), "Blend[a -> b from 2024-03-01 06:00:00 for PT1H]");
        assert_eq!(
            catalogue.schedule_at(at("2024-03-02T06:30:00Z")).current.describe(),
            "Static[c]"
        );
    }

    #[test]
    fn test_backwards_query_matches_fresh_walk() {
        let catalogue = storm_week();
        let mut scheduler = SequentialScheduler::new(catalogue.clone());

        scheduler.current_interpolation(at("2024-01-05T12:00:00Z"));

        for query in ["2024-01-03T14:05:00Z", "2024-01-03T14:00:00Z", "2024-01-01T06:10:00Z"] {
            assert_eq!(
                scheduler.current_interpolation(at(query)),
                catalogue.schedule_at(at(query))
            );
        }
    }

    #[test]
    fn test_single_state_without_transitions() {
        let catalogue = Catalogue::new(
            vec![State::new("idle").with_temperature(20.0)],
            vec![],
            reference_date(),
        )
        .unwrap();

        let climate = catalogue.schedule_at(at("2024-03-01T00:00:00Z"));

        assert_eq!(climate.current, Interpolation::Static(catalogue.states()[0].clone()));
        assert_eq!(climate.next_change, None);
        assert_eq!(climate.next, None);
    }

    #[test]
    fn test_blend_cut_short_by_next_exit() {
        let catalogue = Catalogue::new(
            vec![
                State::new("a").with_temperature(20.0),
                State::new("b").with_temperature(30.0),
            ],
            vec![
                Transition::recurring("a", "b", t!(6:00), t!(2 hours)),
                Transition::recurring("b", "a", t!(7:00), t!(10 minutes)),
            ],
            reference_date(),
        )
        .unwrap();

        let climate = catalogue.schedule_at(at("2024-01-02T06:30:00Z"));

        assert_eq!(climate.current.describe(), "Blend[a -> b from 2024-01-02 06:00:00 for PT2H]");
        assert_eq!(climate.next_change, Some(at("2024-01-02T07:00:00Z")));
        assert_eq!(
            climate.next.map(|next| next.describe()),
            Some("Blend[b -> a from 2024-01-02 07:00:00 for PT10M]".to_owned())
        );
    }
}
