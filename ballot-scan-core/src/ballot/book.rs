use super::validator::BallotId;

/// Ballots per book.
pub const BOOK_SIZE: u32 = 20;

/// Minimum width of the zero-padded book number.
pub const BOOK_NUMBER_WIDTH: usize = 7;

/// Label shown in front of the book identifier.
pub const BOOK_LABEL: &str = "เล่มที่ : ";

/// Book number (1-based) for a ballot, as decimal digits without leading zeros.
///
/// `book = floor(serial / BOOK_SIZE) + 1`, computed on the digit string so
/// serials of any length are exact.
pub fn book_number(id: &BallotId) -> String {
    let mut quotient = divide_decimal(id.serial(), BOOK_SIZE);
    increment_decimal(&mut quotient);

    let first_significant = quotient
        .iter()
        .position(|&d| d != 0)
        .unwrap_or(quotient.len() - 1);
    quotient[first_significant..]
        .iter()
        .map(|&d| char::from(b'0' + d))
        .collect()
}

/// Display string for the book a ballot belongs to, e.g. `เล่มที่ : A0000002`.
///
/// Pure: the same identifier always yields the same string.
pub fn book_id_for(id: &BallotId) -> String {
    format!(
        "{}{}{:0>width$}",
        BOOK_LABEL,
        id.prefix(),
        book_number(id),
        width = BOOK_NUMBER_WIDTH
    )
}

/// Long division of a decimal digit string by a small divisor.
/// Returns the quotient digits, most significant first (may carry leading zeros).
fn divide_decimal(digits: &str, divisor: u32) -> Vec<u8> {
    let mut quotient = Vec::with_capacity(digits.len().max(1));
    let mut remainder: u32 = 0;
    for b in digits.bytes() {
        let current = remainder * 10 + u32::from(b - b'0');
        quotient.push((current / divisor) as u8);
        remainder = current % divisor;
    }
    if quotient.is_empty() {
        quotient.push(0);
    }
    quotient
}

fn increment_decimal(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, 1);
}
