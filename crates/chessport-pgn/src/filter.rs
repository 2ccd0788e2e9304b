use std::collections::BTreeMap;

use chessport_types::{
    game::GameRecord,
    report::ClassTally,
    time_control::{FilterSet, TimeClass},
};

/// Keeps the games admitted by `filter`, preserving order.
pub fn filter_games<'f, I>(games: I, filter: &'f FilterSet) -> impl Iterator<Item = GameRecord> + 'f
where
    I: IntoIterator<Item = GameRecord> + 'f,
    I::IntoIter: 'f,
{
    games.into_iter().filter(move |game| filter.admits(game))
}

/// Per-category counts of `games`. Every requested category gets an entry.
pub fn tally_classes(games: &[GameRecord], filter: &FilterSet) -> BTreeMap<TimeClass, ClassTally> {
    let mut tallies: BTreeMap<TimeClass, ClassTally> = filter
        .classes()
        .map(|class| (class, ClassTally::default()))
        .collect();
    for class in games.iter().filter_map(GameRecord::time_class) {
        if !filter.is_active() || tallies.contains_key(&class) {
            tallies.entry(class).or_default().found += 1;
        }
    }
    tallies
}
