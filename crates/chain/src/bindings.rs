//! Typed bindings for the two contract functions the worker calls.
//!
//! `listPurchases` returns the `Purchase` struct as an unnamed tuple:
//! `(id, text, telegramId, purchasePrice, eraId, purchaser, reward)`.

use ethers::prelude::abigen;

abigen!(
    EraNft,
    r#"[
        {
            "type": "function",
            "name": "listPurchases",
            "inputs": [],
            "outputs": [
                {
                    "name": "",
                    "type": "tuple[]",
                    "components": [
                        { "name": "", "type": "uint64" },
                        { "name": "", "type": "string" },
                        { "name": "", "type": "string" },
                        { "name": "", "type": "uint256" },
                        { "name": "", "type": "uint64" },
                        { "name": "", "type": "address" },
                        { "name": "", "type": "uint8" }
                    ]
                }
            ],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "multipleMintTokenForPurchase",
            "inputs": [
                { "name": "fromIndex", "type": "uint64" },
                { "name": "toIndexInclusive", "type": "uint64" },
                { "name": "tokenURIs", "type": "string[]" }
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        }
    ]"#
);

/// Raw `Purchase` tuple as decoded from `listPurchases`.
pub type RawPurchase = (
    u64,
    String,
    String,
    ethers::types::U256,
    u64,
    ethers::types::Address,
    u8,
);
