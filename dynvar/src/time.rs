use crate::dataset::SliceSource;

/// Pair of slice indices surrounding the current year, with the weight given to the upper
/// slice.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
    pub weight: f64,
}

/// Calendar state consulted by dynamic variables.
///
/// Drivers advance the current year once per step; variables only read from it.
///
pub trait TimeInfo {
    fn current_year(&self) -> i32;

    /// Index of the slice that applies, unblended, at `year`
    fn resolve_nearest(&self, year: i32) -> usize;

    /// Slices to blend at `year`
    fn resolve_bracket(&self, year: i32) -> Bracket;
}

/// Calendar over the years of one dataset.
///
/// Before the first slice, the first slice applies. After the last slice, the last slice
/// applies. In between, the nearest preceding slice is used without interpolation and the
/// surrounding pair with interpolation.
///
#[derive(Clone, Debug)]
pub struct YearCalendar {
    years: Vec<i32>,
    current_year: i32,
}

impl YearCalendar {
    pub fn new(years: Vec<i32>, current_year: i32) -> Self {
        if years.is_empty() {
            panic!("Calendar needs at least one year");
        }
        if years.windows(2).any(|pair| pair[0] >= pair[1]) {
            panic!("Years must be strictly increasing: {years:?}");
        }

        Self {
            years,
            current_year,
        }
    }

    /// Calendar over the years of a dataset's time axis.
    ///
    pub fn for_dataset<N>(source: &dyn SliceSource<N>, current_year: i32) -> Self {
        let years = (0..source.slice_count())
            .map(|index| source.year_of(index))
            .collect();

        Self::new(years, current_year)
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn set_current_year(&mut self, year: i32) {
        self.current_year = year;
    }

    pub fn advance(&mut self, years: i32) {
        self.current_year += years;
    }

    pub fn is_before_time_series(&self) -> bool {
        self.current_year < self.years[0]
    }

    pub fn is_after_time_series(&self) -> bool {
        self.current_year > self.years[self.years.len() - 1]
    }

    /// Number of slices whose year is at or before `year`
    fn count_through(&self, year: i32) -> usize {
        self.years.partition_point(|&slice_year| slice_year <= year)
    }
}

impl TimeInfo for YearCalendar {
    fn current_year(&self) -> i32 {
        self.current_year
    }

    fn resolve_nearest(&self, year: i32) -> usize {
        self.count_through(year).saturating_sub(1)
    }

    fn resolve_bracket(&self, year: i32) -> Bracket {
        let count = self.count_through(year);
        let last = self.years.len() - 1;

        if count == 0 {
            Bracket {
                lower: 0,
                upper: 0,
                weight: 0.0,
            }
        } else if count > last {
            Bracket {
                lower: last,
                upper: last,
                weight: 0.0,
            }
        } else {
            let (lower, upper) = (count - 1, count);
            let span = (self.years[upper] - self.years[lower]) as f64;
            let weight = (year - self.years[lower]) as f64 / span;

            Bracket {
                lower,
                upper,
                weight,
            }
        }
    }
}
