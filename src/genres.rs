//! Day-seeded rotation over the TMDB TV genres shown on the home page.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Genre {
    pub id: i32,
    pub name: &'static str,
}

pub const GENRES: &[Genre] = &[
    Genre { id: 16, name: "Animação" },
    Genre { id: 10759, name: "Ação & Aventura" },
    Genre { id: 35, name: "Comédia" },
    Genre { id: 80, name: "Crime" },
    Genre { id: 18, name: "Drama" },
    Genre { id: 10751, name: "Família" },
    Genre { id: 10762, name: "Kids" },
    Genre { id: 9648, name: "Mistério" },
    Genre { id: 10765, name: "Sci-Fi & Fantasia" },
];

/// `count` consecutive genres (wrapping), starting at an offset fixed for the whole day.
pub fn daily_genres(date: NaiveDate, count: usize) -> Vec<Genre> {
    let len = GENRES.len();
    let count = count.min(len);
    let start = date.num_days_from_ce().rem_euclid(len as i32) as usize;
    GENRES.iter().cycle().skip(start).take(count).copied().collect()
}
