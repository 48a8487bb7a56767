use crate::types::{Operation, RasterError, RasterResult, Sample};

/// Apply `operation` element-wise between two equal-length sequences.
///
/// `canvas_values` is always the left operand and `coverage_values` the
/// right, so Subtract reads canvas - coverage and Divide reads
/// canvas / coverage. Division by zero raises `Arithmetic` instead of
/// letting an infinity or NaN propagate silently through later folds.
pub fn combine(
    operation: Operation,
    canvas_values: &[Sample],
    coverage_values: &[Sample],
) -> RasterResult<Vec<Sample>> {
    if canvas_values.len() != coverage_values.len() {
        return Err(RasterError::LengthMismatch {
            expected: canvas_values.len(),
            found: coverage_values.len(),
        });
    }

    let combined = match operation {
        Operation::Add => canvas_values
            .iter()
            .zip(coverage_values)
            .map(|(a, b)| a + b)
            .collect(),
        Operation::Subtract => canvas_values
            .iter()
            .zip(coverage_values)
            .map(|(a, b)| a - b)
            .collect(),
        Operation::Multiply => canvas_values
            .iter()
            .zip(coverage_values)
            .map(|(a, b)| a * b)
            .collect(),
        Operation::Divide => {
            let mut out = Vec::with_capacity(canvas_values.len());
            for (i, (a, b)) in canvas_values.iter().zip(coverage_values).enumerate() {
                if *b == 0.0 {
                    return Err(RasterError::Arithmetic(format!(
                        "division by zero at sample index {}",
                        i
                    )));
                }
                out.push(a / b);
            }
            out
        }
    };

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let out = combine(Operation::Add, &[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(out, vec![11.0, 22.0, 33.0]);
    }

    #[test]
    fn test_subtract_is_canvas_minus_coverage() {
        let out = combine(Operation::Subtract, &[10.0, 20.0], &[1.0, 2.0]).unwrap();
        assert_eq!(out, vec![9.0, 18.0]);
    }

    #[test]
    fn test_multiply() {
        let out = combine(Operation::Multiply, &[2.0, 3.0], &[4.0, 5.0]).unwrap();
        assert_eq!(out, vec![8.0, 15.0]);
    }

    #[test]
    fn test_divide_is_canvas_over_coverage() {
        let out = combine(Operation::Divide, &[10.0, 9.0], &[2.0, 3.0]).unwrap();
        assert_eq!(out, vec![5.0, 3.0]);
    }

    #[test]
    fn test_divide_by_zero_raises_with_cell_index() {
        let err = combine(Operation::Divide, &[1.0, 2.0, 3.0], &[1.0, 0.0, 3.0]).unwrap_err();
        match err {
            RasterError::Arithmetic(message) => assert!(message.contains("index 1")),
            other => panic!("expected Arithmetic error, got {:?}", other),
        }
    }

    #[test]
    fn test_divide_by_negative_zero_raises() {
        let err = combine(Operation::Divide, &[1.0], &[-0.0]).unwrap_err();
        assert!(matches!(err, RasterError::Arithmetic(_)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = combine(Operation::Add, &[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            RasterError::LengthMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_empty_sequences_combine_to_empty() {
        let out = combine(Operation::Add, &[], &[]).unwrap();
        assert!(out.is_empty());
    }
}
