pub mod limits {

    pub const MIN_COOKING_TIME: i32 = 1;

    pub const MAX_COOKING_TIME: i32 = 400;

    pub const MIN_INGREDIENT_AMOUNT: i32 = 1;

    pub const MAX_INGREDIENT_AMOUNT: i32 = 32_000;

    pub const MAX_RECIPE_NAME_LEN: usize = 200;

    pub const MAX_EMAIL_LEN: usize = 254;

    pub const MAX_USER_FIELD_LEN: usize = 150;

    pub const MIN_PASSWORD_LEN: usize = 8;

    pub const DEFAULT_PAGE_SIZE: u64 = 6;

    pub const MAX_PAGE_SIZE: u64 = 100;
}
