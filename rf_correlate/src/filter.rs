use crate::config::MinValues;

/// Values present in both profiles, in position order
#[derive(Debug, Default, PartialEq)]
pub struct CommonValues {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl CommonValues {
    pub fn len(&self) -> usize {
        self.x.len()
    }
}

/// Positions where both profiles have a value
pub fn common_index(r1: &[Option<f64>], r2: &[Option<f64>]) -> Vec<usize> {
    r1.iter()
        .zip(r2.iter())
        .enumerate()
        .filter_map(|(i, (a, b))| {
            if a.is_some() && b.is_some() {
                Some(i)
            } else {
                None
            }
        })
        .collect()
}

/// Check coverage of common positions against the minimum values threshold.
///
/// At least 2 common values are always required.  A fractional threshold is
/// relative to n_bases, the number of reactive bases in the sequence.
pub fn sufficient_values(n: usize, n_bases: usize, min_values: Option<MinValues>) -> bool {
    if n < 2 {
        return false;
    }
    match min_values {
        None => true,
        Some(MinValues::Count(m)) => n >= m,
        Some(MinValues::Fraction(f)) => n_bases > 0 && (n as f64) / (n_bases as f64) >= f,
    }
}

/// Select values present in both profiles.  Returns None if there are not enough
pub fn filter_common(
    r1: &[Option<f64>],
    r2: &[Option<f64>],
    n_bases: usize,
    min_values: Option<MinValues>,
) -> Option<CommonValues> {
    let ix = common_index(r1, r2);
    if !sufficient_values(ix.len(), n_bases, min_values) {
        return None;
    }
    let mut cv = CommonValues {
        x: Vec::with_capacity(ix.len()),
        y: Vec::with_capacity(ix.len()),
    };
    for i in ix {
        if let (Some(a), Some(b)) = (r1[i], r2[i]) {
            cv.x.push(a);
            cv.y.push(b);
        }
    }
    Some(cv)
}
