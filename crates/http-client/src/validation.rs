//! Checks applied to user input before a request is sent.
use ethsub_common::{Address, BlockParameter, TransactionCall};

use crate::Error;

/// Parses a 40 digit hex address, with or without the `0x` prefix.
pub fn address(s: &str) -> Result<Address, Error> {
    s.parse().map_err(|_| Error::InvalidAddress(s.to_owned()))
}

/// Parses a block number, decimal or `0x` prefixed hex, or one of `latest`,
/// `pending` and `earliest`.
pub fn block_parameter(s: &str) -> Result<BlockParameter, Error> {
    Ok(s.parse()?)
}

pub fn call_target(call: &TransactionCall) -> Result<Address, Error> {
    call.to.ok_or(Error::MissingCallTarget)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::prefixed("0xc94770007dda54cf92009bff0de90c06f603a09f")]
    #[case::unprefixed("C94770007DDA54CF92009BFF0DE90C06F603A09F")]
    fn valid_address(#[case] input: &str) {
        address(input).unwrap();
    }

    #[rstest]
    #[case::empty("")]
    #[case::short("0xc94770007dda54cf92009bff0de90c06f603a0")]
    #[case::long("0xc94770007dda54cf92009bff0de90c06f603a09f00")]
    #[case::not_hex("0xg94770007dda54cf92009bff0de90c06f603a09f")]
    fn invalid_address(#[case] input: &str) {
        assert_matches!(address(input), Err(Error::InvalidAddress(s)) if s == input);
    }

    #[rstest]
    #[case::number("100", BlockParameter::Number(100))]
    #[case::hex("0x64", BlockParameter::Number(100))]
    #[case::latest("latest", BlockParameter::Latest)]
    fn valid_block_parameter(#[case] input: &str, #[case] expected: BlockParameter) {
        assert_eq!(block_parameter(input).unwrap(), expected);
    }

    #[test]
    fn invalid_block_parameter() {
        assert_matches!(block_parameter("finalised"), Err(Error::InvalidBlockParameter(_)));
    }

    #[test]
    fn call_needs_a_target() {
        assert_matches!(
            call_target(&TransactionCall::default()),
            Err(Error::MissingCallTarget)
        );

        let to = address("0xc94770007dda54cf92009bff0de90c06f603a09f").unwrap();
        assert_eq!(call_target(&TransactionCall::to(to)).unwrap(), to);
    }
}
