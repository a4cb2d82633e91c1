use crate::model::{
    ClassConfig, DisabledSeats, SeatIndex, SeatingMap, Student, NEW_STUDENT_NAME,
};
use crate::store::SeatingStore;
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatState<'a> {
    Empty,
    Disabled,
    Occupied(&'a Student),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatCell<'a> {
    pub index: SeatIndex,
    pub row: u32,
    pub col: u32,
    pub state: SeatState<'a>,
}

/// Live seating state for one class.
///
/// Every mutator updates memory and writes the affected records through to
/// the store before returning, so a fresh [`SeatingChart::load`] always
/// observes the same state. Mutators return whether anything changed.
#[derive(Debug, Clone)]
pub struct SeatingChart {
    class_id: String,
    config: ClassConfig,
    roster: Vec<Student>,
    seating: SeatingMap,
    disabled: DisabledSeats,
}

impl SeatingChart {
    pub fn load<S: SeatingStore + ?Sized>(store: &mut S, class_id: &str) -> Self {
        let roster = store.load_roster(class_id);
        if roster.is_defaulted() {
            debug!(class_id, "using default roster");
        }
        let disabled = store.get_disabled_seats(class_id);
        let mut seating = store.get_seating(class_id);

        // A disabled seat never holds an assignment; drop any that slipped in.
        let before = seating.len();
        seating.retain(|seat, _| !disabled.contains(seat));
        if seating.len() != before {
            warn!(
                class_id,
                evicted = before - seating.len(),
                "assignments on disabled seats dropped"
            );
            store.save_seating(class_id, &seating);
        }

        Self {
            class_id: class_id.to_string(),
            config: store.get_class_config(class_id),
            roster: roster.into_inner(),
            seating,
            disabled,
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn config(&self) -> ClassConfig {
        self.config
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn seating(&self) -> &SeatingMap {
        &self.seating
    }

    pub fn disabled_seats(&self) -> &DisabledSeats {
        &self.disabled
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.roster.iter().find(|s| s.id == student_id)
    }

    pub fn is_disabled(&self, seat: SeatIndex) -> bool {
        self.disabled.contains(&seat)
    }

    /// Roster entry sitting at `seat`, if any.
    pub fn occupant(&self, seat: SeatIndex) -> Option<&Student> {
        self.seating.get(&seat).and_then(|id| self.student(id))
    }

    pub fn seat_of(&self, student_id: &str) -> Option<SeatIndex> {
        self.seating
            .iter()
            .find(|(_, id)| id.as_str() == student_id)
            .map(|(seat, _)| *seat)
    }

    pub fn unseated_students(&self) -> Vec<&Student> {
        let seated: HashSet<&str> = self.seating.values().map(String::as_str).collect();
        self.roster
            .iter()
            .filter(|s| !seated.contains(s.id.as_str()))
            .collect()
    }

    /// Every seat of the current grid in row-major order.
    pub fn cells(&self) -> Vec<SeatCell<'_>> {
        (0..self.config.seat_count())
            .map(|index| {
                let (row, col) = self.config.position(index);
                let state = if self.is_disabled(index) {
                    SeatState::Disabled
                } else if let Some(student) = self.occupant(index) {
                    SeatState::Occupied(student)
                } else {
                    SeatState::Empty
                };
                SeatCell {
                    index,
                    row,
                    col,
                    state,
                }
            })
            .collect()
    }

    fn remove_student_mappings(&mut self, student_id: &str) -> bool {
        let before = self.seating.len();
        self.seating.retain(|_, id| id != student_id);
        self.seating.len() != before
    }

    /// Drops `student_id` on `seat`. The student leaves any previous seat and
    /// whoever sat at `seat` becomes unseated.
    pub fn assign<S: SeatingStore + ?Sized>(
        &mut self,
        store: &mut S,
        student_id: &str,
        seat: SeatIndex,
    ) -> bool {
        if self.is_disabled(seat) {
            debug!(class_id = %self.class_id, seat, "assign to disabled seat ignored");
            return false;
        }
        if !self.config.contains(seat) {
            debug!(class_id = %self.class_id, seat, "assign outside grid ignored");
            return false;
        }
        if self.student(student_id).is_none() {
            debug!(class_id = %self.class_id, student_id, "assign of unknown student ignored");
            return false;
        }
        if self.seating.get(&seat).map(String::as_str) == Some(student_id) {
            return false;
        }

        self.remove_student_mappings(student_id);
        if let Some(displaced) = self.seating.insert(seat, student_id.to_string()) {
            debug!(class_id = %self.class_id, seat, displaced = %displaced, "seat occupant displaced");
        }
        store.save_seating(&self.class_id, &self.seating);
        debug!(class_id = %self.class_id, seat, student_id, "student assigned");
        true
    }

    /// Drop on the roster area: removes the student from whatever seat they hold.
    pub fn unseat<S: SeatingStore + ?Sized>(&mut self, store: &mut S, student_id: &str) -> bool {
        let Some(seat) = self.seat_of(student_id) else {
            return false;
        };
        self.remove_student_mappings(student_id);
        store.save_seating(&self.class_id, &self.seating);
        debug!(class_id = %self.class_id, student_id, seat, "student unseated");
        true
    }

    /// Flips a seat's availability. Disabling an occupied seat evicts its occupant.
    pub fn toggle_disabled<S: SeatingStore + ?Sized>(
        &mut self,
        store: &mut S,
        seat: SeatIndex,
    ) -> bool {
        if !self.config.contains(seat) {
            debug!(class_id = %self.class_id, seat, "toggle outside grid ignored");
            return false;
        }

        if self.disabled.remove(&seat) {
            debug!(class_id = %self.class_id, seat, "seat enabled");
        } else {
            self.disabled.insert(seat);
            if self.seating.remove(&seat).is_some() {
                store.save_seating(&self.class_id, &self.seating);
            }
            debug!(class_id = %self.class_id, seat, "seat disabled");
        }
        store.save_disabled_seats(&self.class_id, &self.disabled);
        true
    }

    /// A click toggles availability of empty seats only.
    pub fn click_seat<S: SeatingStore + ?Sized>(&mut self, store: &mut S, seat: SeatIndex) -> bool {
        if self.occupant(seat).is_some() {
            return false;
        }
        self.toggle_disabled(store, seat)
    }

    /// Sets the grid size. Assignments beyond the new bounds are kept, not pruned.
    pub fn resize<S: SeatingStore + ?Sized>(&mut self, store: &mut S, rows: f64, cols: f64) -> bool {
        let next = ClassConfig::clamped(rows, cols);
        let changed = next != self.config;
        self.config = next;
        store.save_class_config(&self.class_id, &self.config);

        let orphaned = self
            .seating
            .keys()
            .filter(|seat| !self.config.contains(**seat))
            .count();
        if orphaned > 0 {
            debug!(class_id = %self.class_id, orphaned, "assignments left outside the grid");
        }
        changed
    }

    /// Replaces the roster and prunes assignments of students no longer in it.
    /// Returns whether the seating map was pruned.
    pub fn update_roster<S: SeatingStore + ?Sized>(
        &mut self,
        store: &mut S,
        next: Vec<Student>,
    ) -> bool {
        let mut ids: HashSet<String> = HashSet::new();
        let mut roster = Vec::with_capacity(next.len());
        for student in next {
            if ids.insert(student.id.clone()) {
                roster.push(student);
            } else {
                warn!(class_id = %self.class_id, student_id = %student.id, "duplicate student id dropped");
            }
        }
        self.roster = roster;
        store.save_roster(&self.class_id, &self.roster);

        let before = self.seating.len();
        self.seating.retain(|_, id| ids.contains(id.as_str()));
        if self.seating.len() == before {
            return false;
        }
        store.save_seating(&self.class_id, &self.seating);
        debug!(
            class_id = %self.class_id,
            pruned = before - self.seating.len(),
            "seating pruned after roster change"
        );
        true
    }

    pub fn add_student<S: SeatingStore + ?Sized>(
        &mut self,
        store: &mut S,
        name: Option<&str>,
    ) -> Student {
        let student = Student::with_generated_id(name.unwrap_or(NEW_STUDENT_NAME));
        let mut next = self.roster.clone();
        next.push(student.clone());
        self.update_roster(store, next);
        student
    }

    fn edit_student<S, F>(&mut self, store: &mut S, student_id: &str, edit: F) -> bool
    where
        S: SeatingStore + ?Sized,
        F: FnOnce(&mut Student),
    {
        let Some(index) = self.roster.iter().position(|s| s.id == student_id) else {
            return false;
        };
        let mut next = self.roster.clone();
        edit(&mut next[index]);
        if next[index] == self.roster[index] {
            return false;
        }
        self.update_roster(store, next);
        true
    }

    pub fn rename_student<S: SeatingStore + ?Sized>(
        &mut self,
        store: &mut S,
        student_id: &str,
        name: &str,
    ) -> bool {
        self.edit_student(store, student_id, |s| s.name = name.to_string())
    }

    /// Stores an already-encoded photo (data URL) on a roster entry.
    pub fn set_student_photo<S: SeatingStore + ?Sized>(
        &mut self,
        store: &mut S,
        student_id: &str,
        photo_url: Option<String>,
    ) -> bool {
        self.edit_student(store, student_id, |s| s.photo_url = photo_url)
    }

    pub fn remove_student<S: SeatingStore + ?Sized>(&mut self, store: &mut S, student_id: &str) -> bool {
        if self.student(student_id).is_none() {
            return false;
        }
        let next = self
            .roster
            .iter()
            .filter(|s| s.id != student_id)
            .cloned()
            .collect();
        self.update_roster(store, next);
        true
    }

    /// Empties every seat. Always persists, even when nothing was seated.
    pub fn clear_seating<S: SeatingStore + ?Sized>(&mut self, store: &mut S) -> bool {
        let changed = !self.seating.is_empty();
        self.seating.clear();
        store.save_seating(&self.class_id, &self.seating);
        debug!(class_id = %self.class_id, "seating cleared");
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RecordKind};

    fn chart_with(store: &mut MemoryStore, rows: u32, cols: u32, ids: &[&str]) -> SeatingChart {
        store.save_class_config("c", &ClassConfig { rows, cols });
        let roster: Vec<Student> = ids
            .iter()
            .map(|id| Student::new(*id, format!("Student {}", id)))
            .collect();
        store.save_roster("c", &roster);
        SeatingChart::load(store, "c")
    }

    fn seated(chart: &SeatingChart) -> Vec<(SeatIndex, &str)> {
        chart
            .seating()
            .iter()
            .map(|(seat, id)| (*seat, id.as_str()))
            .collect()
    }

    fn assert_reload_matches(store: &mut MemoryStore, chart: &SeatingChart) {
        let reloaded = SeatingChart::load(store, chart.class_id());
        assert_eq!(reloaded.config(), chart.config());
        assert_eq!(reloaded.roster(), chart.roster());
        assert_eq!(reloaded.seating(), chart.seating());
        assert_eq!(reloaded.disabled_seats(), chart.disabled_seats());
    }

    #[test]
    fn load_of_unseen_class_uses_defaults() {
        let mut store = MemoryStore::new();
        let chart = SeatingChart::load(&mut store, "block-6-htcs");
        assert_eq!(chart.config(), ClassConfig { rows: 5, cols: 6 });
        assert_eq!(chart.roster().len(), 8);
        assert_eq!(chart.unseated_students().len(), 8);
        assert_eq!(chart.cells().len(), 30);
    }

    #[test]
    fn reassigning_moves_the_student() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 5, 6, &["s1", "s2"]);

        assert!(chart.assign(&mut store, "s1", 3));
        assert!(chart.assign(&mut store, "s1", 7));
        assert_eq!(seated(&chart), vec![(7, "s1")]);
        assert_eq!(chart.seat_of("s1"), Some(7));
        assert!(chart.occupant(3).is_none());
        assert_reload_matches(&mut store, &chart);

        // Same seat again is a no-op.
        assert!(!chart.assign(&mut store, "s1", 7));
    }

    #[test]
    fn last_drop_wins_and_clear_empties() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 2, 2, &["A", "B"]);

        chart.assign(&mut store, "A", 0);
        chart.assign(&mut store, "B", 0);
        assert_eq!(seated(&chart), vec![(0, "B")]);
        let unseated: Vec<&str> = chart
            .unseated_students()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(unseated, vec!["A"]);

        assert!(chart.clear_seating(&mut store));
        assert!(chart.seating().is_empty());
        assert_eq!(
            store
                .get_item(&RecordKind::Seating.key("c"))
                .expect("read")
                .as_deref(),
            Some("{}")
        );
        assert!(!chart.clear_seating(&mut store));
    }

    #[test]
    fn disabling_evicts_and_blocks_assignment() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 5, 6, &["s1", "s2"]);
        chart.assign(&mut store, "s1", 4);

        assert!(chart.toggle_disabled(&mut store, 4));
        assert!(chart.is_disabled(4));
        assert!(chart.seating().is_empty());
        assert_reload_matches(&mut store, &chart);

        assert!(!chart.assign(&mut store, "s2", 4));
        assert!(chart.occupant(4).is_none());

        assert!(chart.toggle_disabled(&mut store, 4));
        assert!(!chart.is_disabled(4));
        assert!(chart.assign(&mut store, "s2", 4));
    }

    #[test]
    fn clicking_toggles_only_empty_seats() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 2, 3, &["s1"]);
        chart.assign(&mut store, "s1", 1);

        assert!(!chart.click_seat(&mut store, 1));
        assert!(!chart.is_disabled(1));
        assert_eq!(chart.seat_of("s1"), Some(1));

        assert!(chart.click_seat(&mut store, 2));
        assert!(chart.is_disabled(2));
        assert!(chart.click_seat(&mut store, 2));
        assert!(!chart.is_disabled(2));
    }

    #[test]
    fn out_of_grid_and_unknown_students_are_ignored() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 2, 2, &["s1"]);
        assert!(!chart.assign(&mut store, "s1", 4));
        assert!(!chart.assign(&mut store, "ghost", 0));
        assert!(!chart.toggle_disabled(&mut store, 9));
        assert!(chart.seating().is_empty());
        assert!(chart.disabled_seats().is_empty());
        assert!(!chart.unseat(&mut store, "s1"));
    }

    #[test]
    fn unseat_frees_the_seat() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 2, 2, &["s1", "s2"]);
        chart.assign(&mut store, "s1", 0);
        chart.assign(&mut store, "s2", 3);

        assert!(chart.unseat(&mut store, "s1"));
        assert_eq!(seated(&chart), vec![(3, "s2")]);
        assert_reload_matches(&mut store, &chart);
    }

    #[test]
    fn roster_update_prunes_removed_students() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 5, 6, &["s1", "s2", "s3"]);
        chart.assign(&mut store, "s1", 1);
        chart.assign(&mut store, "s2", 2);

        let next: Vec<Student> = chart
            .roster()
            .iter()
            .filter(|s| s.id != "s2")
            .cloned()
            .collect();
        assert!(chart.update_roster(&mut store, next));
        assert_eq!(seated(&chart), vec![(1, "s1")]);
        assert_reload_matches(&mut store, &chart);

        // Nothing left to prune.
        let same = chart.roster().to_vec();
        assert!(!chart.update_roster(&mut store, same));
    }

    #[test]
    fn roster_update_keeps_first_duplicate() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 2, 2, &[]);
        chart.update_roster(
            &mut store,
            vec![
                Student::new("s1", "First"),
                Student::new("s1", "Second"),
                Student::new("s2", "Other"),
            ],
        );
        assert_eq!(chart.roster().len(), 2);
        assert_eq!(chart.student("s1").map(|s| s.name.as_str()), Some("First"));
    }

    #[test]
    fn roster_edits_write_through() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 2, 2, &["s1"]);
        chart.assign(&mut store, "s1", 0);

        let added = chart.add_student(&mut store, None);
        assert_eq!(added.name, NEW_STUDENT_NAME);
        assert_eq!(chart.roster().last(), Some(&added));

        assert!(chart.rename_student(&mut store, &added.id, "Zed"));
        assert!(!chart.rename_student(&mut store, &added.id, "Zed"));
        assert!(chart.set_student_photo(
            &mut store,
            &added.id,
            Some("data:image/png;base64,AAAA".into())
        ));
        assert!(!chart.rename_student(&mut store, "ghost", "Nobody"));
        assert_reload_matches(&mut store, &chart);

        assert!(chart.remove_student(&mut store, "s1"));
        assert!(chart.seating().is_empty());
        assert!(!chart.remove_student(&mut store, "s1"));
        assert_reload_matches(&mut store, &chart);
    }

    #[test]
    fn shrinking_keeps_orphaned_assignments() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 3, 3, &["s1"]);
        chart.assign(&mut store, "s1", 8);

        assert!(chart.resize(&mut store, 2.0, 2.0));
        assert_eq!(chart.config(), ClassConfig { rows: 2, cols: 2 });
        assert_eq!(chart.cells().len(), 4);
        assert_eq!(seated(&chart), vec![(8, "s1")]);
        assert_reload_matches(&mut store, &chart);

        chart.resize(&mut store, 3.0, 3.0);
        assert_eq!(chart.occupant(8).map(|s| s.id.as_str()), Some("s1"));
    }

    #[test]
    fn resize_clamps() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 2, 2, &[]);
        chart.resize(&mut store, 0.0, 25.0);
        assert_eq!(chart.config(), ClassConfig { rows: 1, cols: 20 });
        assert_eq!(store.get_class_config("c"), ClassConfig { rows: 1, cols: 20 });
    }

    #[test]
    fn cells_report_state_per_seat() {
        let mut store = MemoryStore::new();
        let mut chart = chart_with(&mut store, 2, 2, &["s1"]);
        chart.assign(&mut store, "s1", 1);
        chart.toggle_disabled(&mut store, 2);

        let cells = chart.cells();
        assert_eq!(cells[0].state, SeatState::Empty);
        assert!(matches!(cells[1].state, SeatState::Occupied(s) if s.id == "s1"));
        assert_eq!(cells[2].state, SeatState::Disabled);
        assert_eq!((cells[3].row, cells[3].col), (1, 1));
    }

    #[test]
    fn load_evicts_assignments_on_disabled_seats() {
        let mut store = MemoryStore::new();
        store.save_roster("c", &[Student::new("s1", "Ann"), Student::new("s2", "Bo")]);
        let mut seating = SeatingMap::new();
        seating.insert(4, "s1".into());
        seating.insert(5, "s2".into());
        store.save_seating("c", &seating);
        store.save_disabled_seats("c", &DisabledSeats::from([4]));

        let mut chart = SeatingChart::load(&mut store, "c");
        assert_eq!(seated(&chart), vec![(5, "s2")]);
        assert_eq!(chart.cells()[4].state, SeatState::Disabled);
        let unseated: Vec<&str> = chart
            .unseated_students()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(unseated, vec!["s1"]);
        assert_eq!(store.get_seating("c").len(), 1);

        assert!(chart.click_seat(&mut store, 4));
        assert!(!chart.is_disabled(4));
        assert!(chart.assign(&mut store, "s1", 4));
    }

    #[test]
    fn load_leaves_consistent_records_untouched() {
        let mut store = MemoryStore::new();
        store.save_roster("c", &[Student::new("s1", "Ann")]);
        store
            .set_item(&RecordKind::Seating.key("c"), r#"{"1":"s1"}"#)
            .expect("memory write");
        store.save_disabled_seats("c", &DisabledSeats::from([4]));

        SeatingChart::load(&mut store, "c");
        assert_eq!(
            store
                .get_item(&RecordKind::Seating.key("c"))
                .expect("read")
                .as_deref(),
            Some(r#"{"1":"s1"}"#)
        );
    }

    #[test]
    fn stale_map_entries_render_empty() {
        let mut store = MemoryStore::new();
        let mut seating = SeatingMap::new();
        seating.insert(0, "gone".into());
        store.save_seating("c", &seating);
        let chart = chart_with(&mut store, 2, 2, &["s1"]);
        assert_eq!(chart.cells()[0].state, SeatState::Empty);
        assert_eq!(chart.unseated_students().len(), 1);
    }
}
